//! Spend authorizations
//!
//! Builds the canonical message that proves the holder of a fund may move
//! `amount` to a destination credential, and packages its signature into the
//! envelope the settlement service accepts.

mod envelope;
mod message;

pub use envelope::*;
pub use message::*;

use crate::codec::CodecError;
use crate::wallet::WalletError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("Invalid authorization input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

pub type AuthorizationResult<T> = Result<T, AuthorizationError>;
