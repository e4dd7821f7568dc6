//! Native application values and on-chain Plutus data

use num_bigint::BigInt;
use serde_json::{json, Value as Json};

use super::shape::is_capitalized;
use super::CodecError;

/// An application value, before it has been checked against a shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(BigInt),
    /// Hex-encoded byte string
    Bytes(String),
    Bool(bool),
    /// Absent value, used by the optional convention
    Null,
    /// The void constructor
    Unit,
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    /// Raw constructor with an explicit index
    Constr { index: u64, fields: Vec<Value> },
    /// Enum variant selected by its (capitalized) name
    Variant { tag: String, fields: Vec<Value> },
}

/// On-chain datum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlutusData {
    Integer(BigInt),
    Bytes(Vec<u8>),
    List(Vec<PlutusData>),
    Map(Vec<(PlutusData, PlutusData)>),
    Constr { index: u64, fields: Vec<PlutusData> },
}

impl PlutusData {
    pub fn void() -> Self {
        PlutusData::Constr {
            index: 0,
            fields: vec![],
        }
    }

    pub fn integer(n: impl Into<BigInt>) -> Self {
        PlutusData::Integer(n.into())
    }

    pub fn constr(index: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { index, fields }
    }

    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            PlutusData::Constr { index, fields } => Some((*index, fields)),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PlutusData::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            PlutusData::Integer(n) => Some(n),
            _ => None,
        }
    }
}

impl PlutusData {
    /// Detailed JSON form: `{"int": n}`, `{"bytes": hex}`, `{"list": [..]}`,
    /// `{"map": [{"k": .., "v": ..}]}`, `{"constructor": i, "fields": [..]}`.
    /// Integers outside the 64-bit range are written as decimal strings.
    pub fn to_json(&self) -> Json {
        match self {
            PlutusData::Integer(n) => {
                let number = i64::try_from(n)
                    .map(Json::from)
                    .or_else(|_| u64::try_from(n).map(Json::from))
                    .unwrap_or_else(|_| Json::String(n.to_string()));
                json!({ "int": number })
            }
            PlutusData::Bytes(b) => json!({ "bytes": hex::encode(b) }),
            PlutusData::List(items) => json!({ "list": items.iter().map(PlutusData::to_json).collect::<Vec<_>>() }),
            PlutusData::Map(entries) => json!({
                "map": entries
                    .iter()
                    .map(|(k, v)| json!({ "k": k.to_json(), "v": v.to_json() }))
                    .collect::<Vec<_>>()
            }),
            PlutusData::Constr { index, fields } => json!({
                "constructor": index,
                "fields": fields.iter().map(PlutusData::to_json).collect::<Vec<_>>()
            }),
        }
    }
}

impl Value {
    pub fn int(n: impl Into<BigInt>) -> Self {
        Value::Int(n.into())
    }

    pub fn bytes(raw: &[u8]) -> Self {
        Value::Bytes(hex::encode(raw))
    }

    pub fn variant(tag: impl Into<String>, fields: Vec<Value>) -> Self {
        Value::Variant {
            tag: tag.into(),
            fields,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bytes(_) => "bytes",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Unit => "unit",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Constr { .. } => "constructor",
            Value::Variant { .. } => "variant",
        }
    }

    /// Build a value from its JSON form.
    ///
    /// Numbers are integers, strings are hex bytes, `{"int": "..."}` carries
    /// integers beyond 64 bits, `{"map": [[k, v], ...]}` is a map,
    /// `{"constructor": n, "fields": [...]}` a raw constructor and
    /// `{"Tag": [...]}` an enum variant.
    pub fn from_json(json: &Json) -> Result<Self, CodecError> {
        from_json_at(json, "$")
    }
}

fn from_json_at(json: &Json, path: &str) -> Result<Value, CodecError> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::int(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::int(u))
            } else {
                Err(CodecError::mismatch(path, format!("{} is not an integer", n)))
            }
        }
        Json::String(s) => Ok(Value::Bytes(s.clone())),
        Json::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| from_json_at(item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Json::Object(obj) => {
            if let Some(raw) = obj.get("int") {
                let text = match raw {
                    Json::String(s) => s.clone(),
                    Json::Number(n) => n.to_string(),
                    _ => return Err(CodecError::mismatch(path, "\"int\" must be a string or number")),
                };
                return text
                    .trim()
                    .parse::<BigInt>()
                    .map(Value::Int)
                    .map_err(|_| CodecError::mismatch(path, format!("'{}' is not an integer", text)));
            }

            if let Some(entries) = obj.get("map") {
                let Json::Array(entries) = entries else {
                    return Err(CodecError::mismatch(path, "\"map\" must be an array of pairs"));
                };
                let mut pairs = Vec::with_capacity(entries.len());
                for (i, entry) in entries.iter().enumerate() {
                    let entry_path = format!("{}.map[{}]", path, i);
                    match entry {
                        Json::Array(kv) if kv.len() == 2 => {
                            let key = from_json_at(&kv[0], &format!("{}.key", entry_path))?;
                            let value = from_json_at(&kv[1], &format!("{}.value", entry_path))?;
                            pairs.push((key, value));
                        }
                        _ => return Err(CodecError::mismatch(&entry_path, "expected [key, value]")),
                    }
                }
                return Ok(Value::Map(pairs));
            }

            if let Some(index) = obj.get("constructor") {
                let index = index
                    .as_u64()
                    .ok_or_else(|| CodecError::mismatch(path, "constructor index must be unsigned"))?;
                let fields = match obj.get("fields") {
                    Some(Json::Array(items)) => items
                        .iter()
                        .enumerate()
                        .map(|(i, f)| from_json_at(f, &format!("{}.fields[{}]", path, i)))
                        .collect::<Result<Vec<_>, _>>()?,
                    None => vec![],
                    Some(_) => return Err(CodecError::mismatch(path, "\"fields\" must be an array")),
                };
                return Ok(Value::Constr { index, fields });
            }

            if obj.len() != 1 {
                return Err(CodecError::mismatch(
                    path,
                    "object must be a single {\"Tag\": fields} variant",
                ));
            }
            let (tag, payload) = obj
                .iter()
                .next()
                .ok_or_else(|| CodecError::mismatch(path, "empty object"))?;
            if !is_capitalized(tag) {
                return Err(CodecError::mismatch(
                    path,
                    format!("variant tag '{}' must start with a capital letter", tag),
                ));
            }
            let field_path = format!("{}.{}", path, tag);
            let fields = match payload {
                Json::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, f)| from_json_at(f, &format!("{}[{}]", field_path, i)))
                    .collect::<Result<Vec<_>, _>>()?,
                Json::Null => vec![],
                single => vec![from_json_at(single, &field_path)?],
            };
            Ok(Value::Variant {
                tag: tag.clone(),
                fields,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(&json!(42)).unwrap(), Value::int(42));
        assert_eq!(Value::from_json(&json!("cafe")).unwrap(), Value::Bytes("cafe".into()));
        assert_eq!(Value::from_json(&json!(null)).unwrap(), Value::Null);
        assert_eq!(
            Value::from_json(&json!({"int": "-340282366920938463463374607431768211455"})).unwrap(),
            Value::int(-BigInt::from(u128::MAX))
        );
    }

    #[test]
    fn test_from_json_beyond_128_bits() {
        let text = "-3402823669209384634633746074317682114560000";
        let value = Value::from_json(&json!({ "int": text })).unwrap();
        assert_eq!(value, Value::Int(text.parse().unwrap()));
        assert!(Value::from_json(&json!({"int": "12x"})).is_err());
    }

    #[test]
    fn test_from_json_variant() {
        let value = Value::from_json(&json!({"VerificationKey": ["abcd"]})).unwrap();
        assert_eq!(value, Value::variant("VerificationKey", vec![Value::Bytes("abcd".into())]));

        let unit_variant = Value::from_json(&json!({"None": null})).unwrap();
        assert_eq!(unit_variant, Value::variant("None", vec![]));
    }

    #[test]
    fn test_from_json_lowercase_tag_rejected() {
        let err = Value::from_json(&json!({"some": [1]})).unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_from_json_map_and_constr() {
        let value = Value::from_json(&json!({"map": [["aa", 1], ["bb", 2]]})).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![
                (Value::Bytes("aa".into()), Value::int(1)),
                (Value::Bytes("bb".into()), Value::int(2)),
            ])
        );

        let constr = Value::from_json(&json!({"constructor": 3, "fields": [7]})).unwrap();
        assert_eq!(constr, Value::Constr { index: 3, fields: vec![Value::int(7)] });
    }

    #[test]
    fn test_data_to_json() {
        let data = PlutusData::constr(
            1,
            vec![
                PlutusData::integer(-5),
                PlutusData::integer(u64::MAX as i128 + 1),
                PlutusData::Bytes(vec![0xca, 0xfe]),
                PlutusData::Map(vec![(PlutusData::Bytes(vec![]), PlutusData::List(vec![]))]),
            ],
        );
        assert_eq!(
            data.to_json(),
            json!({
                "constructor": 1,
                "fields": [
                    {"int": -5},
                    {"int": "18446744073709551616"},
                    {"bytes": "cafe"},
                    {"map": [{"k": {"bytes": ""}, "v": {"list": []}}]}
                ]
            })
        );
    }
}
