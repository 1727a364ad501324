//! SPL Token program instructions and account layouts.
//!
//! Implements the handful of Token program instructions this workspace needs
//! (InitializeMint, MintTo, Transfer) and unpacks the fixed-size Mint and
//! Account states, without pulling in the `spl-token` crate.

use crate::address::Pubkey;
use crate::error::SolError;
use crate::transaction::{SolAccountMeta, SolInstruction};

/// SPL Token Program ID: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey::new([
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79,
    0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff,
    0x00, 0xa9,
]);

/// Rent sysvar: `SysvarRent111111111111111111111111111111111`
pub const SYSVAR_RENT_ID: Pubkey = Pubkey::new([
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x5c, 0x51, 0x21, 0x8c, 0xc9, 0x4c, 0x3d, 0x4a, 0xf1,
    0x7f, 0x58, 0xda, 0xee, 0x08, 0x9b, 0xa1, 0xfd, 0x44, 0xe3, 0xdb, 0xd9, 0x8a, 0x00, 0x00,
    0x00, 0x00,
]);

/// Size of a Mint account.
pub const MINT_LEN: usize = 82;

/// Size of a token Account.
pub const TOKEN_ACCOUNT_LEN: usize = 165;

const INITIALIZE_MINT_TAG: u8 = 0;
const TRANSFER_TAG: u8 = 3;
const MINT_TO_TAG: u8 = 7;

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Build an `InitializeMint` instruction.
///
/// # Wire format
///
/// `[0] | decimals u8 | mint_authority 32 | COption<freeze_authority>`
/// where the option is one tag byte followed by the key when present.
pub fn build_initialize_mint(
    mint: &Pubkey,
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> SolInstruction {
    let mut data = Vec::with_capacity(67);
    data.push(INITIALIZE_MINT_TAG);
    data.push(decimals);
    data.extend_from_slice(mint_authority.as_bytes());
    match freeze_authority {
        Some(key) => {
            data.push(1);
            data.extend_from_slice(key.as_bytes());
        }
        None => data.push(0),
    }

    SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*mint, false),
            SolAccountMeta::readonly(SYSVAR_RENT_ID, false),
        ],
        data,
    }
}

/// Build a `MintTo` instruction: `[7] | amount u64 LE`.
pub fn build_mint_to(
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Result<SolInstruction, SolError> {
    if amount == 0 {
        return Err(SolError::TransactionBuildError(
            "mint amount must be > 0".into(),
        ));
    }

    Ok(SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*mint, false),
            SolAccountMeta::writable(*destination, false),
            SolAccountMeta::readonly(*authority, true),
        ],
        data: amount_data(MINT_TO_TAG, amount),
    })
}

/// Build a `Transfer` instruction: `[3] | amount u64 LE`.
///
/// `amount` is in base units (for a 6-decimal token, `1_000_000` is one
/// whole token).
pub fn build_spl_transfer(
    source: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Result<SolInstruction, SolError> {
    if amount == 0 {
        return Err(SolError::TransactionBuildError(
            "SPL transfer amount must be > 0".into(),
        ));
    }

    Ok(SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*source, false),
            SolAccountMeta::writable(*destination, false),
            SolAccountMeta::readonly(*owner, true),
        ],
        data: amount_data(TRANSFER_TAG, amount),
    })
}

fn amount_data(tag: u8, amount: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(9);
    data.push(tag);
    data.extend_from_slice(&amount.to_le_bytes());
    data
}

// ---------------------------------------------------------------------------
// Account state
// ---------------------------------------------------------------------------

/// Decoded Mint account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mint {
    pub mint_authority: Option<Pubkey>,
    pub supply: u64,
    pub decimals: u8,
    pub freeze_authority: Option<Pubkey>,
}

/// Decoded token Account (balance holder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

/// Unpack the 82-byte Mint layout:
///
/// ```text
/// 0..36   COption<Pubkey> mint_authority (u32 tag + key)
/// 36..44  u64 supply
/// 44      u8 decimals
/// 45      bool is_initialized
/// 46..82  COption<Pubkey> freeze_authority
/// ```
pub fn unpack_mint(data: &[u8]) -> Result<Mint, SolError> {
    check_len(data, MINT_LEN, "mint")?;

    if data[45] == 0 {
        return Err(SolError::InvalidAccountData("mint is not initialized".into()));
    }

    Ok(Mint {
        mint_authority: unpack_coption_key(&data[0..36])?,
        supply: read_u64(&data[36..44]),
        decimals: data[44],
        freeze_authority: unpack_coption_key(&data[46..82])?,
    })
}

/// Unpack the 165-byte token Account layout. Only the fields this workspace
/// reads are decoded: mint (0..32), owner (32..64) and amount (64..72); the
/// account state byte (108) must be non-zero.
pub fn unpack_token_account(data: &[u8]) -> Result<TokenAccount, SolError> {
    check_len(data, TOKEN_ACCOUNT_LEN, "token account")?;

    if data[108] == 0 {
        return Err(SolError::InvalidAccountData(
            "token account is not initialized".into(),
        ));
    }

    Ok(TokenAccount {
        mint: read_key(&data[0..32]),
        owner: read_key(&data[32..64]),
        amount: read_u64(&data[64..72]),
    })
}

fn check_len(data: &[u8], expected: usize, what: &str) -> Result<(), SolError> {
    if data.len() != expected {
        return Err(SolError::InvalidAccountData(format!(
            "{what}: expected {expected} bytes, got {}",
            data.len()
        )));
    }
    Ok(())
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn read_key(bytes: &[u8]) -> Pubkey {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(bytes);
    Pubkey::new(buf)
}

fn unpack_coption_key(bytes: &[u8]) -> Result<Option<Pubkey>, SolError> {
    match &bytes[..4] {
        [0, 0, 0, 0] => Ok(None),
        [1, 0, 0, 0] => Ok(Some(read_key(&bytes[4..36]))),
        _ => Err(SolError::InvalidAccountData("invalid COption tag".into())),
    }
}
