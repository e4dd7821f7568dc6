//! Casting native values into Plutus data under a shape

use super::shape::{enum_convention, is_capitalized, ConstructorShape, EnumConvention, Shape};
use super::value::{PlutusData, Value};
use super::CodecError;

/// Cast a value against a shape.
///
/// Every mismatch (kind, arity, unknown discriminator) is an error; nothing
/// is coerced.
pub fn cast(value: &Value, shape: &Shape) -> Result<PlutusData, CodecError> {
    cast_at(value, shape, "$")
}

fn cast_at(value: &Value, shape: &Shape, path: &str) -> Result<PlutusData, CodecError> {
    match shape {
        Shape::Integer => match value {
            Value::Int(n) => Ok(PlutusData::Integer(n.clone())),
            other => Err(expected(path, shape, other)),
        },

        Shape::Bytes => match value {
            Value::Bytes(hex_str) => hex::decode(hex_str)
                .map(PlutusData::Bytes)
                .map_err(|e| CodecError::mismatch(path, format!("invalid hex: {}", e))),
            other => Err(expected(path, shape, other)),
        },

        Shape::List(item_shape) => match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| cast_at(item, item_shape, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(PlutusData::List),
            other => Err(expected(path, shape, other)),
        },

        Shape::Tuple(item_shapes) => match value {
            Value::List(items) => {
                if items.len() != item_shapes.len() {
                    return Err(CodecError::mismatch(
                        path,
                        format!(
                            "tuple of {} elements, got {}",
                            item_shapes.len(),
                            items.len()
                        ),
                    ));
                }
                items
                    .iter()
                    .zip(item_shapes)
                    .enumerate()
                    .map(|(i, (item, s))| cast_at(item, s, &format!("{}[{}]", path, i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(PlutusData::List)
            }
            other => Err(expected(path, shape, other)),
        },

        Shape::Map { keys, values } => match value {
            Value::Map(entries) => entries
                .iter()
                .enumerate()
                .map(|(i, (k, v))| {
                    let key = cast_at(k, keys, &format!("{}.key[{}]", path, i))?;
                    let val = cast_at(v, values, &format!("{}.value[{}]", path, i))?;
                    Ok((key, val))
                })
                .collect::<Result<Vec<_>, CodecError>>()
                .map(PlutusData::Map),
            other => Err(expected(path, shape, other)),
        },

        Shape::Constructor(constructor) => cast_constructor(value, constructor, path),

        Shape::Enum(variants) => cast_enum(value, variants, path),
    }
}

fn cast_constructor(
    value: &Value,
    shape: &ConstructorShape,
    path: &str,
) -> Result<PlutusData, CodecError> {
    let fields: &[Value] = match value {
        Value::Unit if shape.is_void() => &[],
        Value::Constr { index, fields } => {
            if *index != shape.index {
                return Err(CodecError::mismatch(
                    path,
                    format!("constructor index {} expected, got {}", shape.index, index),
                ));
            }
            fields
        }
        Value::Variant { tag, fields } => {
            if *tag != shape.name {
                return Err(CodecError::mismatch(
                    path,
                    format!("constructor '{}' expected, got '{}'", shape.name, tag),
                ));
            }
            fields
        }
        Value::List(fields) => fields,
        other => {
            return Err(CodecError::mismatch(
                path,
                format!("expected {} fields for '{}', got {}", shape.fields.len(), shape.name, other.kind()),
            ))
        }
    };
    constr_fields(shape, fields, path)
}

fn constr_fields(
    shape: &ConstructorShape,
    fields: &[Value],
    path: &str,
) -> Result<PlutusData, CodecError> {
    if fields.len() != shape.fields.len() {
        return Err(CodecError::mismatch(
            path,
            format!(
                "'{}' takes {} fields, got {}",
                shape.name,
                shape.fields.len(),
                fields.len()
            ),
        ));
    }
    let fields = fields
        .iter()
        .zip(&shape.fields)
        .enumerate()
        .map(|(i, (f, s))| cast_at(f, s, &format!("{}.{}[{}]", path, shape.name, i)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PlutusData::Constr {
        index: shape.index,
        fields,
    })
}

fn cast_enum(
    value: &Value,
    variants: &[ConstructorShape],
    path: &str,
) -> Result<PlutusData, CodecError> {
    match enum_convention(variants) {
        EnumConvention::Boolean => {
            if let Value::Bool(b) = value {
                let name = if *b { "True" } else { "False" };
                let variant = find_variant(variants, name, path)?;
                return constr_fields(variant, &[], path);
            }
        }
        EnumConvention::Optional => {
            return match value {
                // an explicit tag is taken as written, so `Some(None)` stays expressible
                Value::Variant { tag, fields } if tag == "Some" || tag == "None" => {
                    constr_fields(find_variant(variants, tag, path)?, fields, path)
                }
                Value::Null => constr_fields(find_variant(variants, "None", path)?, &[], path),
                present => {
                    let some = find_variant(variants, "Some", path)?;
                    constr_fields(some, std::slice::from_ref(present), path)
                }
            };
        }
        EnumConvention::General => {}
    }

    match value {
        Value::Variant { tag, fields } => {
            if !is_capitalized(tag) {
                return Err(CodecError::mismatch(
                    path,
                    format!("variant tag '{}' must start with a capital letter", tag),
                ));
            }
            constr_fields(find_variant(variants, tag, path)?, fields, path)
        }
        other => Err(CodecError::mismatch(
            path,
            format!("expected a tagged variant, got {}", other.kind()),
        )),
    }
}

fn find_variant<'a>(
    variants: &'a [ConstructorShape],
    name: &str,
    path: &str,
) -> Result<&'a ConstructorShape, CodecError> {
    variants
        .iter()
        .find(|v| v.name == name)
        .ok_or_else(|| CodecError::mismatch(path, format!("unknown variant '{}'", name)))
}

fn expected(path: &str, shape: &Shape, got: &Value) -> CodecError {
    CodecError::mismatch(path, format!("expected {}, got {}", shape.kind(), got.kind()))
}
