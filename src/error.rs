//! Unified error types for micropay-core
//!
//! Module-level errors (`CodecError`, `AuthorizationError`, `WalletError`)
//! all flow into `CoreError` for consistent handling and FFI-safe reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all fund-authorization operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl CoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ShapeMismatch, msg)
    }

    pub fn invalid_phrase(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPhrase, msg)
    }

    pub fn signing_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningError, msg)
    }

    pub fn network_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::JsonError, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Generic text safe to show an end user.
    ///
    /// Never includes shape internals, paths, or key material; the detailed
    /// `message` stays on the developer side.
    pub fn user_message(&self) -> &'static str {
        match self.code {
            ErrorCode::ShapeMismatch | ErrorCode::UnsupportedShape | ErrorCode::DecodeError => {
                "The payment data could not be prepared."
            }
            ErrorCode::InvalidInput => "The request is incomplete or invalid.",
            ErrorCode::InvalidPhrase => "The recovery phrase is not valid.",
            ErrorCode::InvalidPath => "The account selection is not valid.",
            ErrorCode::SigningError => "The payment could not be authorized.",
            ErrorCode::PartialData => "Some balance details are temporarily unavailable.",
            ErrorCode::NetworkError | ErrorCode::Timeout => {
                "The service is unreachable. Please try again."
            }
            ErrorCode::JsonError | ErrorCode::HexError => "The request could not be read.",
            ErrorCode::ConfigError => "The application is misconfigured.",
            ErrorCode::Internal => "Something went wrong.",
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CoreError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Codec errors
    ShapeMismatch,
    UnsupportedShape,
    DecodeError,

    // Message builder errors
    InvalidInput,

    // Signing service errors
    InvalidPhrase,
    InvalidPath,
    SigningError,

    // Reconciler (non-fatal, reported inside snapshots)
    PartialData,

    // Network errors
    NetworkError,
    Timeout,

    // Parse errors
    JsonError,
    HexError,

    // Internal
    ConfigError,
    Internal,
}

/// Result type alias for micropay-core operations
pub type CoreResult<T> = Result<T, CoreError>;

// Conversions from common error types

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CoreError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            CoreError::new(ErrorCode::NetworkError, "Connection failed")
        } else {
            CoreError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}

impl From<crate::codec::CodecError> for CoreError {
    fn from(e: crate::codec::CodecError) -> Self {
        use crate::codec::CodecError;
        let code = match &e {
            CodecError::ShapeMismatch { .. } => ErrorCode::ShapeMismatch,
            CodecError::UnsupportedShape(_) => ErrorCode::UnsupportedShape,
            CodecError::Decode(_) => ErrorCode::DecodeError,
        };
        CoreError::new(code, e.to_string())
    }
}

impl From<crate::codec::DecodeError> for CoreError {
    fn from(e: crate::codec::DecodeError) -> Self {
        CoreError::new(ErrorCode::DecodeError, e.to_string())
    }
}

impl From<crate::authorization::AuthorizationError> for CoreError {
    fn from(e: crate::authorization::AuthorizationError) -> Self {
        use crate::authorization::AuthorizationError;
        match e {
            AuthorizationError::InvalidInput(msg) => CoreError::invalid_input(msg),
            AuthorizationError::Codec(inner) => inner.into(),
            AuthorizationError::Wallet(inner) => inner.into(),
        }
    }
}

impl From<crate::wallet::WalletError> for CoreError {
    fn from(e: crate::wallet::WalletError) -> Self {
        use crate::wallet::WalletError;
        let code = match &e {
            WalletError::InvalidPhrase(_) => ErrorCode::InvalidPhrase,
            WalletError::InvalidPath(_) => ErrorCode::InvalidPath,
            WalletError::InvalidAddress(_) => ErrorCode::InvalidInput,
            WalletError::SigningError(_) => ErrorCode::SigningError,
            WalletError::Derivation(_) => ErrorCode::Internal,
        };
        CoreError::new(code, e.to_string())
    }
}
