//! Plutus data codec
//!
//! Schema-directed encoding of application values into canonical on-chain CBOR:
//! - `Shape` descriptors (integer, bytes, list, tuple, map, constructor, enum)
//! - Native `Value`s cast against a shape into `PlutusData`
//! - CBOR serialization (canonical and default modes)
//! - CBOR decoding back into `PlutusData`
//! - CIP-57 blueprint schemas as a shape source

pub mod shape;
pub mod value;
pub mod cast;
pub mod cbor;
pub mod decoder;
pub mod blueprint;

#[cfg(test)]
mod tests;

pub use shape::*;
pub use value::*;
pub use cast::cast;
pub use cbor::to_cbor;
pub use decoder::{decode, DecodeError};

use std::fmt;

/// Errors raised while casting or encoding a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Shape mismatch at {path}: {reason}")]
    ShapeMismatch { path: String, reason: String },

    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl CodecError {
    pub fn mismatch(path: &str, reason: impl Into<String>) -> Self {
        CodecError::ShapeMismatch {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Encoded on-chain value: immutable bytes with a canonical hex form
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedValue {
    bytes: Vec<u8>,
}

impl EncodedValue {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parse a hex string, checking that it holds exactly one well-formed datum
    pub fn from_hex(hex_str: &str) -> Result<Self, DecodeError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        decode(&bytes)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode back into structured data
    pub fn to_data(&self) -> Result<PlutusData, DecodeError> {
        decode(&self.bytes)
    }
}

impl AsRef<[u8]> for EncodedValue {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedValue({})", self.to_hex())
    }
}

/// Encode a value against its shape.
///
/// The output is a pure function of `(value, shape, canonical)`. On any
/// failure nothing is produced.
pub fn encode(value: &Value, shape: &Shape, canonical: bool) -> Result<EncodedValue, CodecError> {
    shape.validate()?;
    let data = cast(value, shape)?;
    Ok(EncodedValue::new(to_cbor(&data, canonical)))
}

/// Serialize already-structured data without a shape
pub fn encode_data(data: &PlutusData, canonical: bool) -> EncodedValue {
    EncodedValue::new(to_cbor(data, canonical))
}
