//! CIP-57 blueprint schemas as shape sources
//!
//! Only the Plutus data subset is accepted (`integer`, `bytes`, `list`, `map`,
//! `constructor`, `anyOf` of constructors, and `$ref`). Builtin `#...` types and
//! opaque `{}` schemas have no canonical shape here.

use serde_json::{Map, Value as Json};

use super::shape::{ConstructorShape, Shape};
use super::CodecError;

/// Recursion bound for `$ref` chains
const MAX_DEPTH: usize = 64;

impl Shape {
    /// Parse a schema document. If it has a `definitions` object, `$ref`s are
    /// resolved against it; a top-level `schema` key, when present, is the root.
    pub fn from_blueprint_json(json: &str) -> Result<Shape, CodecError> {
        let doc: Json = serde_json::from_str(json)
            .map_err(|e| CodecError::UnsupportedShape(format!("invalid schema JSON: {}", e)))?;
        let empty = Map::new();
        let definitions = doc
            .get("definitions")
            .and_then(Json::as_object)
            .unwrap_or(&empty);
        let root = doc.get("schema").unwrap_or(&doc);
        shape_from_schema(root, definitions)
    }
}

/// Convert one schema node into a shape
pub fn shape_from_schema(schema: &Json, definitions: &Map<String, Json>) -> Result<Shape, CodecError> {
    convert(schema, definitions, 0)
}

fn convert(schema: &Json, defs: &Map<String, Json>, depth: usize) -> Result<Shape, CodecError> {
    if depth > MAX_DEPTH {
        return Err(CodecError::UnsupportedShape("schema nesting too deep".into()));
    }
    let obj = schema
        .as_object()
        .ok_or_else(|| CodecError::UnsupportedShape("schema must be an object".into()))?;

    if let Some(reference) = obj.get("$ref").and_then(Json::as_str) {
        return convert(resolve(reference, defs)?, defs, depth + 1);
    }

    if let Some(variants) = obj.get("anyOf").and_then(Json::as_array) {
        // A single-variant anyOf is a plain record
        let mut constructors = variants
            .iter()
            .map(|v| constructor(v, defs, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        if constructors.len() == 1 {
            return Ok(Shape::Constructor(constructors.remove(0)));
        }
        return Ok(Shape::Enum(constructors));
    }

    let data_type = obj
        .get("dataType")
        .and_then(Json::as_str)
        .ok_or_else(|| CodecError::UnsupportedShape("schema without dataType (opaque data)".into()))?;

    match data_type {
        "integer" => Ok(Shape::Integer),
        "bytes" => Ok(Shape::Bytes),
        "list" => match obj.get("items") {
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| convert(item, defs, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Shape::Tuple),
            Some(item) => Ok(Shape::list(convert(item, defs, depth + 1)?)),
            None => Err(CodecError::UnsupportedShape("list without items".into())),
        },
        "map" => {
            let keys = obj
                .get("keys")
                .ok_or_else(|| CodecError::UnsupportedShape("map without keys".into()))?;
            let values = obj
                .get("values")
                .ok_or_else(|| CodecError::UnsupportedShape("map without values".into()))?;
            Ok(Shape::map(
                convert(keys, defs, depth + 1)?,
                convert(values, defs, depth + 1)?,
            ))
        }
        "constructor" => constructor(schema, defs, depth).map(Shape::Constructor),
        other => Err(CodecError::UnsupportedShape(format!("dataType '{}'", other))),
    }
}

fn constructor(
    schema: &Json,
    defs: &Map<String, Json>,
    depth: usize,
) -> Result<ConstructorShape, CodecError> {
    let schema = match schema.get("$ref").and_then(Json::as_str) {
        Some(reference) => resolve(reference, defs)?,
        None => schema,
    };
    if schema.get("dataType").and_then(Json::as_str) != Some("constructor") {
        return Err(CodecError::UnsupportedShape(
            "anyOf members must be constructors".into(),
        ));
    }
    let index = schema
        .get("index")
        .and_then(Json::as_u64)
        .ok_or_else(|| CodecError::UnsupportedShape("constructor without index".into()))?;
    let name = schema
        .get("title")
        .and_then(Json::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Constr{}", index));
    let fields = schema
        .get("fields")
        .and_then(Json::as_array)
        .map(|fields| {
            fields
                .iter()
                .map(|f| convert(f, defs, depth + 1))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();
    Ok(ConstructorShape::new(name, index, fields))
}

fn resolve<'a>(reference: &str, defs: &'a Map<String, Json>) -> Result<&'a Json, CodecError> {
    let key = reference
        .strip_prefix("#/definitions/")
        .ok_or_else(|| CodecError::UnsupportedShape(format!("external $ref '{}'", reference)))?
        .replace("~1", "/")
        .replace("~0", "~");
    defs.get(&key)
        .ok_or_else(|| CodecError::UnsupportedShape(format!("unknown $ref '{}'", reference)))
}
