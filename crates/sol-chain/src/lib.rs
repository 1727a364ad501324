//! Solana primitives for the token workspace.
//!
//! Address handling, key pairs, System / SPL Token / Associated Token Account
//! instruction builders, account-state unpacking, and the legacy transaction
//! wire format with multi-signer partial signing. Everything here is pure and
//! network-free.

pub mod address;
pub mod associated_token;
pub mod error;
pub mod keypair;
pub mod spl_token;
pub mod system;
pub mod transaction;

pub use address::{address_to_bytes, Pubkey};
pub use associated_token::{
    build_create_associated_token_account, derive_associated_token_address,
    ASSOCIATED_TOKEN_PROGRAM_ID,
};
pub use error::SolError;
pub use keypair::Keypair;
pub use spl_token::{
    build_initialize_mint, build_mint_to, build_spl_transfer, unpack_mint, unpack_token_account,
    Mint, TokenAccount, MINT_LEN, TOKEN_ACCOUNT_LEN, TOKEN_PROGRAM_ID,
};
pub use system::SYSTEM_PROGRAM_ID;
pub use transaction::{
    decode_compact_u16, encode_compact_u16, CompiledInstruction, Message, SolAccountMeta,
    SolInstruction, SolTransaction,
};
