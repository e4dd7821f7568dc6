//! CBOR serialization of Plutus data
//!
//! Default mode follows the ledger's usual encoding (indefinite-length lists);
//! canonical mode uses definite lengths throughout and orders map entries by
//! their encoded key bytes.

use num_bigint::{BigInt, Sign};

use super::value::PlutusData;

pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;

pub(crate) const INDEFINITE_BYTES: u8 = 0x5f;
pub(crate) const INDEFINITE_ARRAY: u8 = 0x9f;
pub(crate) const BREAK: u8 = 0xff;

pub(crate) const TAG_POSITIVE_BIGNUM: u64 = 2;
pub(crate) const TAG_NEGATIVE_BIGNUM: u64 = 3;
pub(crate) const TAG_CONSTR_GENERAL: u64 = 102;
pub(crate) const TAG_CONSTR_SMALL: u64 = 121;
pub(crate) const TAG_CONSTR_LARGE: u64 = 1280;

/// Ledger limit for a single byte-string chunk
pub(crate) const BYTES_CHUNK: usize = 64;

/// Serialize data to CBOR
pub fn to_cbor(data: &PlutusData, canonical: bool) -> Vec<u8> {
    let mut out = Vec::new();
    write_data(&mut out, data, canonical);
    out
}

fn write_data(out: &mut Vec<u8>, data: &PlutusData, canonical: bool) {
    match data {
        PlutusData::Integer(n) => write_integer(out, n),
        PlutusData::Bytes(bytes) => write_bounded_bytes(out, bytes),
        PlutusData::List(items) => write_list(out, items, canonical),
        PlutusData::Map(entries) => write_map(out, entries, canonical),
        PlutusData::Constr { index, fields } => write_constr(out, *index, fields, canonical),
    }
}

pub(crate) fn write_head(out: &mut Vec<u8>, major: u8, value: u64) {
    let m = major << 5;
    if value < 24 {
        out.push(m | value as u8);
    } else if value <= u8::MAX as u64 {
        out.push(m | 24);
        out.push(value as u8);
    } else if value <= u16::MAX as u64 {
        out.push(m | 25);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u32::MAX as u64 {
        out.push(m | 26);
        out.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        out.push(m | 27);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

fn write_integer(out: &mut Vec<u8>, n: &BigInt) {
    let (major, tag, magnitude) = if n.sign() == Sign::Minus {
        // CBOR negative integers encode -1 - n
        (MAJOR_NEGATIVE, TAG_NEGATIVE_BIGNUM, -(n + BigInt::from(1)))
    } else {
        (MAJOR_UNSIGNED, TAG_POSITIVE_BIGNUM, n.clone())
    };
    match u64::try_from(&magnitude) {
        Ok(small) => write_head(out, major, small),
        Err(_) => {
            let (_, be) = magnitude.to_bytes_be();
            write_head(out, MAJOR_TAG, tag);
            write_bounded_bytes(out, &be);
        }
    }
}

fn write_bounded_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    if bytes.len() <= BYTES_CHUNK {
        write_head(out, MAJOR_BYTES, bytes.len() as u64);
        out.extend_from_slice(bytes);
        return;
    }
    out.push(INDEFINITE_BYTES);
    for chunk in bytes.chunks(BYTES_CHUNK) {
        write_head(out, MAJOR_BYTES, chunk.len() as u64);
        out.extend_from_slice(chunk);
    }
    out.push(BREAK);
}

fn write_list(out: &mut Vec<u8>, items: &[PlutusData], canonical: bool) {
    if canonical || items.is_empty() {
        write_head(out, MAJOR_ARRAY, items.len() as u64);
        for item in items {
            write_data(out, item, canonical);
        }
    } else {
        out.push(INDEFINITE_ARRAY);
        for item in items {
            write_data(out, item, canonical);
        }
        out.push(BREAK);
    }
}

fn write_map(out: &mut Vec<u8>, entries: &[(PlutusData, PlutusData)], canonical: bool) {
    write_head(out, MAJOR_MAP, entries.len() as u64);

    if !canonical {
        for (key, value) in entries {
            write_data(out, key, canonical);
            write_data(out, value, canonical);
        }
        return;
    }

    let mut encoded: Vec<(Vec<u8>, Vec<u8>)> = entries
        .iter()
        .map(|(k, v)| (to_cbor(k, true), to_cbor(v, true)))
        .collect();
    encoded.sort();
    for (key, value) in encoded {
        out.extend_from_slice(&key);
        out.extend_from_slice(&value);
    }
}

fn write_constr(out: &mut Vec<u8>, index: u64, fields: &[PlutusData], canonical: bool) {
    match index {
        0..=6 => {
            write_head(out, MAJOR_TAG, TAG_CONSTR_SMALL + index);
            write_list(out, fields, canonical);
        }
        7..=127 => {
            write_head(out, MAJOR_TAG, TAG_CONSTR_LARGE + index - 7);
            write_list(out, fields, canonical);
        }
        _ => {
            write_head(out, MAJOR_TAG, TAG_CONSTR_GENERAL);
            write_head(out, MAJOR_ARRAY, 2);
            write_head(out, MAJOR_UNSIGNED, index);
            write_list(out, fields, canonical);
        }
    }
}
