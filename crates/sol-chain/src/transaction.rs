//! Legacy Solana transaction wire format and multi-signer signing.
//!
//! Transactions are built entirely by hand. The layout is:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! A transaction carries one signature slot per required signer. Slots start
//! zeroed and are filled independently, so a freshly generated account key
//! can sign before the fee payer's wallet does.

use crate::address::{bytes_to_address, Pubkey};
use crate::error::SolError;
use crate::keypair::{verify_signature, Keypair};

const EMPTY_SIGNATURE: [u8; 64] = [0u8; 64];

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in Solana's compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 value from a byte slice.
///
/// Returns `(value, bytes_consumed)` or an error if the data is truncated.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    let mut shift = 0u32;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            SolError::SerializationError("unexpected end of data while decoding compact-u16".into())
        })?;
        consumed += 1;

        value |= ((byte & 0x7f) as u32) << shift;
        shift += 7;

        if byte & 0x80 == 0 || consumed >= 3 {
            break;
        }
    }

    if value > u16::MAX as u32 {
        return Err(SolError::SerializationError("compact-u16 value overflow".into()));
    }

    Ok((value as u16, consumed))
}

fn compact_len(len: usize, what: &str) -> Result<Vec<u8>, SolError> {
    let len = u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("too many {what}: {len}")))?;
    Ok(encode_compact_u16(len))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in a Solana instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl SolAccountMeta {
    pub fn writable(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A Solana instruction (before it is compiled into a transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled instruction where account references are replaced by u8 indices
/// into the message's `account_keys` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,

    /// All account keys in canonical order:
    ///   1. writable signers (fee payer first)
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<Pubkey>,

    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile instructions into a message with a single fee payer.
    ///
    /// The fee payer is always a writable signer at index 0.
    pub fn compile(
        instructions: &[SolInstruction],
        fee_payer: &Pubkey,
        recent_blockhash: &[u8; 32],
    ) -> Result<Self, SolError> {
        if instructions.is_empty() {
            return Err(SolError::TransactionBuildError(
                "transaction has no instructions".into(),
            ));
        }

        struct AccountEntry {
            pubkey: Pubkey,
            is_signer: bool,
            is_writable: bool,
        }

        // Instruction account lists are tiny, a Vec scan beats a map here.
        let mut entries: Vec<AccountEntry> = Vec::new();
        let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(AccountEntry {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        upsert(*fee_payer, true, true);
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // Stable sort: insertion order survives within a category, which keeps
        // the fee payer (inserted first, writable signer) at index 0.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if entries.len() > u8::MAX as usize {
            return Err(SolError::TransactionBuildError(format!(
                "too many accounts: {}",
                entries.len()
            )));
        }

        let count =
            |pred: fn(&AccountEntry) -> bool| entries.iter().filter(|e| pred(e)).count() as u8;
        let num_required_signatures = count(|e| e.is_signer);
        let num_readonly_signed = count(|e| e.is_signer && !e.is_writable);
        let num_readonly_unsigned = count(|e| !e.is_signer && !e.is_writable);

        let account_keys: Vec<Pubkey> = entries.iter().map(|e| e.pubkey).collect();
        let index_of = |key: &Pubkey| -> Result<u8, SolError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| {
                    SolError::TransactionBuildError(format!("{key} not in account keys"))
                })
        };

        let mut compiled = Vec::with_capacity(instructions.len());
        for ix in instructions {
            let program_id_index = index_of(&ix.program_id)?;
            let account_indices = ix
                .accounts
                .iter()
                .map(|meta| index_of(&meta.pubkey))
                .collect::<Result<Vec<_>, _>>()?;

            compiled.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data: ix.data.clone(),
            });
        }

        Ok(Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash: *recent_blockhash,
            instructions: compiled,
        })
    }

    /// The accounts whose signatures this message requires, in slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        let n = (self.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Serialize the message (the bytes that get signed).
    pub fn serialize(&self) -> Result<Vec<u8>, SolError> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.num_required_signatures);
        buf.push(self.num_readonly_signed);
        buf.push(self.num_readonly_unsigned);

        buf.extend_from_slice(&compact_len(self.account_keys.len(), "account keys")?);
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_bytes());
        }

        buf.extend_from_slice(&self.recent_blockhash);

        buf.extend_from_slice(&compact_len(self.instructions.len(), "instructions")?);
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            buf.extend_from_slice(&compact_len(ix.account_indices.len(), "instruction accounts")?);
            buf.extend_from_slice(&ix.account_indices);
            buf.extend_from_slice(&compact_len(ix.data.len(), "instruction data bytes")?);
            buf.extend_from_slice(&ix.data);
        }

        Ok(buf)
    }

    /// Parse a legacy message. Returns the message and the bytes consumed.
    pub fn deserialize(data: &[u8]) -> Result<(Self, usize), SolError> {
        let mut reader = Reader { data, pos: 0 };

        let num_required_signatures = reader.u8()?;
        if num_required_signatures & 0x80 != 0 {
            return Err(SolError::SerializationError(
                "versioned messages are not supported".into(),
            ));
        }
        let num_readonly_signed = reader.u8()?;
        let num_readonly_unsigned = reader.u8()?;

        let num_accounts = reader.compact_u16()?;
        let mut account_keys = Vec::with_capacity(num_accounts as usize);
        for _ in 0..num_accounts {
            account_keys.push(Pubkey::new(reader.array::<32>()?));
        }

        let recent_blockhash = reader.array::<32>()?;

        let num_instructions = reader.compact_u16()?;
        let mut instructions = Vec::with_capacity(num_instructions as usize);
        for _ in 0..num_instructions {
            let program_id_index = reader.u8()?;
            let n = reader.compact_u16()? as usize;
            let account_indices = reader.bytes(n)?.to_vec();
            let n = reader.compact_u16()? as usize;
            let data = reader.bytes(n)?.to_vec();
            instructions.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data,
            });
        }

        let message = Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash,
            instructions,
        };
        Ok((message, reader.pos))
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize) -> Result<&'a [u8], SolError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len());
        let end = end.ok_or_else(|| {
            SolError::SerializationError(format!(
                "unexpected end of data: need {n} bytes at offset {}",
                self.pos
            ))
        })?;
        let data = self.data;
        let out = &data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, SolError> {
        Ok(self.bytes(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], SolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn compact_u16(&mut self) -> Result<u16, SolError> {
        let (value, consumed) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// A transaction: a message plus one signature slot per required signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransaction {
    pub signatures: Vec<[u8; 64]>,
    pub message: Message,
}

impl SolTransaction {
    /// Wrap a message with every signature slot empty.
    pub fn new_unsigned(message: Message) -> Self {
        let slots = message.num_required_signatures as usize;
        Self {
            signatures: vec![EMPTY_SIGNATURE; slots],
            message,
        }
    }

    /// Compile instructions and wrap the result as an unsigned transaction.
    pub fn compile(
        instructions: &[SolInstruction],
        fee_payer: &Pubkey,
        recent_blockhash: &[u8; 32],
    ) -> Result<Self, SolError> {
        Message::compile(instructions, fee_payer, recent_blockhash).map(Self::new_unsigned)
    }

    /// Fill the signature slot belonging to `keypair`, leaving the others.
    pub fn partial_sign(&mut self, keypair: &Keypair) -> Result<(), SolError> {
        let pubkey = keypair.pubkey();
        let slot = self
            .message
            .signer_keys()
            .iter()
            .position(|k| *k == pubkey)
            .ok_or_else(|| {
                SolError::SigningError(format!("{pubkey} not found in transaction signers"))
            })?;

        let message_bytes = self.message.serialize()?;
        self.signatures[slot] = keypair.sign_message(&message_bytes);
        Ok(())
    }

    /// Signers whose slot is still empty.
    pub fn missing_signers(&self) -> Vec<Pubkey> {
        self.message
            .signer_keys()
            .iter()
            .zip(&self.signatures)
            .filter(|(_, sig)| **sig == EMPTY_SIGNATURE)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Check that every slot holds a valid signature over the message.
    pub fn verify_signatures(&self) -> Result<(), SolError> {
        let signers = self.message.signer_keys();
        if signers.len() != self.signatures.len() {
            return Err(SolError::SigningError(format!(
                "expected {} signatures, found {}",
                signers.len(),
                self.signatures.len()
            )));
        }

        let message_bytes = self.message.serialize()?;
        for (key, sig) in signers.iter().zip(&self.signatures) {
            if *sig == EMPTY_SIGNATURE {
                return Err(SolError::SigningError(format!("missing signature for {key}")));
            }
            if !verify_signature(key, &message_bytes, sig) {
                return Err(SolError::SigningError(format!("invalid signature for {key}")));
            }
        }
        Ok(())
    }

    /// The transaction id: the fee payer's signature in Base58, once present.
    pub fn signature(&self) -> Option<String> {
        self.signatures
            .first()
            .filter(|sig| **sig != EMPTY_SIGNATURE)
            .map(|sig| bs58::encode(sig).into_string())
    }

    /// Serialize into the wire format accepted by `sendTransaction`.
    pub fn to_wire(&self) -> Result<Vec<u8>, SolError> {
        let message_bytes = self.message.serialize()?;
        let mut wire = Vec::with_capacity(3 + 64 * self.signatures.len() + message_bytes.len());

        wire.extend_from_slice(&compact_len(self.signatures.len(), "signatures")?);
        for sig in &self.signatures {
            wire.extend_from_slice(sig);
        }
        wire.extend_from_slice(&message_bytes);

        Ok(wire)
    }

    /// Parse a legacy wire-format transaction.
    pub fn from_wire(raw: &[u8]) -> Result<Self, SolError> {
        let (num_sigs, mut pos) = decode_compact_u16(raw)?;
        if num_sigs == 0 {
            return Err(SolError::SerializationError(
                "transaction has zero signatures".into(),
            ));
        }

        let sigs_end = pos + num_sigs as usize * 64;
        if sigs_end > raw.len() {
            return Err(SolError::SerializationError(
                "transaction too short: signature slots exceed length".into(),
            ));
        }

        let mut signatures = Vec::with_capacity(num_sigs as usize);
        while pos < sigs_end {
            let mut sig = [0u8; 64];
            sig.copy_from_slice(&raw[pos..pos + 64]);
            signatures.push(sig);
            pos += 64;
        }

        let (message, consumed) = Message::deserialize(&raw[sigs_end..])?;
        if sigs_end + consumed != raw.len() {
            return Err(SolError::SerializationError(
                "trailing bytes after transaction message".into(),
            ));
        }
        if message.num_required_signatures as usize != signatures.len() {
            return Err(SolError::SerializationError(format!(
                "message requires {} signatures, transaction carries {}",
                message.num_required_signatures,
                signatures.len()
            )));
        }

        Ok(Self { signatures, message })
    }

    /// Decode the compiled instructions back into full instructions.
    pub fn decompile_instructions(&self) -> Result<Vec<SolInstruction>, SolError> {
        let keys = &self.message.account_keys;
        let key_at = |i: u8| -> Result<Pubkey, SolError> {
            keys.get(i as usize).copied().ok_or_else(|| {
                SolError::SerializationError(format!("account index {i} out of range"))
            })
        };

        self.message
            .instructions
            .iter()
            .map(|ix| {
                let accounts = ix
                    .account_indices
                    .iter()
                    .map(|&i| {
                        Ok(SolAccountMeta {
                            pubkey: key_at(i)?,
                            is_signer: self.is_signer_index(i as usize),
                            is_writable: self.is_writable_index(i as usize),
                        })
                    })
                    .collect::<Result<Vec<_>, SolError>>()?;

                Ok(SolInstruction {
                    program_id: key_at(ix.program_id_index)?,
                    accounts,
                    data: ix.data.clone(),
                })
            })
            .collect()
    }

    fn is_signer_index(&self, i: usize) -> bool {
        i < self.message.num_required_signatures as usize
    }

    fn is_writable_index(&self, i: usize) -> bool {
        let m = &self.message;
        let signers = m.num_required_signatures as usize;
        if i < signers {
            i < signers.saturating_sub(m.num_readonly_signed as usize)
        } else {
            i < m.account_keys.len().saturating_sub(m.num_readonly_unsigned as usize)
        }
    }
}

/// Base58 form of a 32-byte blockhash.
pub fn blockhash_to_string(blockhash: &[u8; 32]) -> String {
    bytes_to_address(blockhash)
}
