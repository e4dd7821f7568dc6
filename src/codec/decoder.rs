//! CBOR decoding of Plutus data

use num_bigint::{BigInt, Sign};

use super::cbor::*;
use super::value::PlutusData;

/// Deepest list/map/constructor nesting accepted
pub const MAX_DEPTH: usize = 256;

/// Errors raised while decoding CBOR
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Unexpected end of input at offset {0}")]
    UnexpectedEnd(usize),

    #[error("Trailing bytes after datum at offset {0}")]
    TrailingBytes(usize),

    #[error("Unsupported CBOR item 0x{byte:02x} at offset {offset}")]
    Unsupported { byte: u8, offset: usize },

    #[error("Unsupported tag {0}")]
    UnsupportedTag(u64),

    #[error("Integer out of range")]
    IntegerOverflow,

    #[error("Malformed data: {0}")]
    Malformed(String),
}

/// Decode exactly one datum from `bytes`
pub fn decode(bytes: &[u8]) -> Result<PlutusData, DecodeError> {
    let mut reader = Reader {
        bytes,
        pos: 0,
        depth: 0,
    };
    let data = reader.data()?;
    if reader.pos != bytes.len() {
        return Err(DecodeError::TrailingBytes(reader.pos));
    }
    Ok(data)
}

/// Length of an item header: definite count or indefinite marker
enum Len {
    Definite(u64),
    Indefinite,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Result<u8, DecodeError> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEnd(self.pos))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(DecodeError::UnexpectedEnd(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn head(&mut self) -> Result<(u8, Len), DecodeError> {
        let offset = self.pos;
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let info = initial & 0x1f;
        let len = match info {
            0..=23 => Len::Definite(info as u64),
            24 => Len::Definite(self.take(1)?[0] as u64),
            25 => Len::Definite(u16::from_be_bytes(self.array()?) as u64),
            26 => Len::Definite(u32::from_be_bytes(self.array()?) as u64),
            27 => Len::Definite(u64::from_be_bytes(self.array()?)),
            31 => Len::Indefinite,
            _ => return Err(DecodeError::Unsupported { byte: initial, offset }),
        };
        Ok((major, len))
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn definite(&self, len: Len, what: &str) -> Result<u64, DecodeError> {
        match len {
            Len::Definite(n) => Ok(n),
            Len::Indefinite => Err(DecodeError::Malformed(format!("indefinite {}", what))),
        }
    }

    fn at_break(&mut self) -> Result<bool, DecodeError> {
        if self.peek()? == BREAK {
            self.pos += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn data(&mut self) -> Result<PlutusData, DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::Malformed("nesting too deep".into()));
        }
        self.depth += 1;
        let data = self.item();
        self.depth -= 1;
        data
    }

    fn item(&mut self) -> Result<PlutusData, DecodeError> {
        let offset = self.pos;
        let initial = self.peek()?;
        let (major, len) = self.head()?;
        match major {
            MAJOR_UNSIGNED => {
                let n = self.definite(len, "integer")?;
                Ok(PlutusData::integer(n))
            }
            MAJOR_NEGATIVE => {
                let n = self.definite(len, "integer")?;
                Ok(PlutusData::integer(-1 - i128::from(n)))
            }
            MAJOR_BYTES => self.bytes_body(len).map(PlutusData::Bytes),
            MAJOR_ARRAY => self.list_body(len).map(PlutusData::List),
            MAJOR_MAP => {
                let mut entries = Vec::new();
                match len {
                    Len::Definite(n) => {
                        for _ in 0..n {
                            let key = self.data()?;
                            let value = self.data()?;
                            entries.push((key, value));
                        }
                    }
                    Len::Indefinite => {
                        while !self.at_break()? {
                            let key = self.data()?;
                            let value = self.data()?;
                            entries.push((key, value));
                        }
                    }
                }
                Ok(PlutusData::Map(entries))
            }
            MAJOR_TAG => {
                let tag = self.definite(len, "tag")?;
                self.tagged(tag)
            }
            _ => Err(DecodeError::Unsupported { byte: initial, offset }),
        }
    }

    fn bytes_body(&mut self, len: Len) -> Result<Vec<u8>, DecodeError> {
        match len {
            Len::Definite(n) => {
                let n = usize::try_from(n).map_err(|_| DecodeError::UnexpectedEnd(self.pos))?;
                Ok(self.take(n)?.to_vec())
            }
            Len::Indefinite => {
                let mut out = Vec::new();
                while !self.at_break()? {
                    let (major, chunk_len) = self.head()?;
                    if major != MAJOR_BYTES {
                        return Err(DecodeError::Malformed("non-bytes chunk in byte string".into()));
                    }
                    let n = self.definite(chunk_len, "nested chunk")?;
                    let n = usize::try_from(n).map_err(|_| DecodeError::UnexpectedEnd(self.pos))?;
                    out.extend_from_slice(self.take(n)?);
                }
                Ok(out)
            }
        }
    }

    fn list_body(&mut self, len: Len) -> Result<Vec<PlutusData>, DecodeError> {
        let mut items = Vec::new();
        match len {
            Len::Definite(n) => {
                for _ in 0..n {
                    items.push(self.data()?);
                }
            }
            Len::Indefinite => {
                while !self.at_break()? {
                    items.push(self.data()?);
                }
            }
        }
        Ok(items)
    }

    fn list(&mut self) -> Result<Vec<PlutusData>, DecodeError> {
        let offset = self.pos;
        let initial = self.peek()?;
        let (major, len) = self.head()?;
        if major != MAJOR_ARRAY {
            return Err(DecodeError::Unsupported { byte: initial, offset });
        }
        self.list_body(len)
    }

    fn tagged(&mut self, tag: u64) -> Result<PlutusData, DecodeError> {
        match tag {
            TAG_POSITIVE_BIGNUM | TAG_NEGATIVE_BIGNUM => {
                let (major, len) = self.head()?;
                if major != MAJOR_BYTES {
                    return Err(DecodeError::Malformed("bignum payload must be bytes".into()));
                }
                let magnitude = BigInt::from_bytes_be(Sign::Plus, &self.bytes_body(len)?);
                if tag == TAG_POSITIVE_BIGNUM {
                    Ok(PlutusData::Integer(magnitude))
                } else {
                    Ok(PlutusData::Integer(-magnitude - BigInt::from(1)))
                }
            }
            121..=127 => Ok(PlutusData::Constr {
                index: tag - TAG_CONSTR_SMALL,
                fields: self.list()?,
            }),
            1280..=1400 => Ok(PlutusData::Constr {
                index: tag - TAG_CONSTR_LARGE + 7,
                fields: self.list()?,
            }),
            TAG_CONSTR_GENERAL => {
                let (major, len) = self.head()?;
                if major != MAJOR_ARRAY || !matches!(len, Len::Definite(2)) {
                    return Err(DecodeError::Malformed("tag 102 must wrap [index, fields]".into()));
                }
                let index = match self.data()? {
                    PlutusData::Integer(n) if n.sign() != Sign::Minus => {
                        u64::try_from(&n).map_err(|_| DecodeError::IntegerOverflow)?
                    }
                    _ => return Err(DecodeError::Malformed("constructor index".into())),
                };
                Ok(PlutusData::Constr {
                    index,
                    fields: self.list()?,
                })
            }
            other => Err(DecodeError::UnsupportedTag(other)),
        }
    }
}
