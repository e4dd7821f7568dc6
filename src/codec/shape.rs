//! Shape descriptors for Plutus data

use std::collections::HashSet;
use std::fmt;

use super::CodecError;

/// Describes how a value is validated and encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Arbitrary-precision integer
    Integer,

    /// Byte string, supplied as hex
    Bytes,

    /// Homogeneous list
    List(Box<Shape>),

    /// Fixed-arity list with one shape per position
    Tuple(Vec<Shape>),

    /// Key/value map
    Map { keys: Box<Shape>, values: Box<Shape> },

    /// Tagged product
    Constructor(ConstructorShape),

    /// Tagged sum of constructors
    Enum(Vec<ConstructorShape>),
}

/// One constructor: name, tag index and positional fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorShape {
    pub name: String,
    pub index: u64,
    pub fields: Vec<Shape>,
}

impl ConstructorShape {
    pub fn new(name: impl Into<String>, index: u64, fields: Vec<Shape>) -> Self {
        Self {
            name: name.into(),
            index,
            fields,
        }
    }

    pub fn is_void(&self) -> bool {
        self.index == 0 && self.fields.is_empty()
    }
}

/// Which special convention an enum follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumConvention {
    /// `False` / `True` with no fields, driven by native booleans
    Boolean,
    /// `Some(x)` / `None`, driven by native null
    Optional,
    /// Dispatch by capitalized tag
    General,
}

impl Shape {
    pub fn list(items: Shape) -> Self {
        Shape::List(Box::new(items))
    }

    pub fn map(keys: Shape, values: Shape) -> Self {
        Shape::Map {
            keys: Box::new(keys),
            values: Box::new(values),
        }
    }

    pub fn constructor(index: u64, fields: Vec<Shape>) -> Self {
        Shape::Constructor(ConstructorShape::new(format!("Constr{}", index), index, fields))
    }

    /// The distinguished unit constructor (index 0, no fields)
    pub fn void() -> Self {
        Shape::Constructor(ConstructorShape::new("Void", 0, vec![]))
    }

    pub fn boolean() -> Self {
        Shape::Enum(vec![
            ConstructorShape::new("False", 0, vec![]),
            ConstructorShape::new("True", 1, vec![]),
        ])
    }

    /// `Some(inner)` at index 0, `None` at index 1
    pub fn optional(inner: Shape) -> Self {
        Shape::Enum(vec![
            ConstructorShape::new("Some", 0, vec![inner]),
            ConstructorShape::new("None", 1, vec![]),
        ])
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Integer => "integer",
            Shape::Bytes => "bytes",
            Shape::List(_) => "list",
            Shape::Tuple(_) => "tuple",
            Shape::Map { .. } => "map",
            Shape::Constructor(_) => "constructor",
            Shape::Enum(_) => "enum",
        }
    }

    /// Check the shape itself is well-formed
    pub fn validate(&self) -> Result<(), CodecError> {
        match self {
            Shape::Integer | Shape::Bytes => Ok(()),
            Shape::List(items) => items.validate(),
            Shape::Tuple(items) => items.iter().try_for_each(Shape::validate),
            Shape::Map { keys, values } => {
                keys.validate()?;
                values.validate()
            }
            Shape::Constructor(c) => c.fields.iter().try_for_each(Shape::validate),
            Shape::Enum(variants) => validate_enum(variants),
        }
    }
}

fn validate_enum(variants: &[ConstructorShape]) -> Result<(), CodecError> {
    if variants.is_empty() {
        return Err(CodecError::UnsupportedShape("enum without variants".into()));
    }

    let mut names = HashSet::new();
    let mut indices = HashSet::new();
    for variant in variants {
        if !is_capitalized(&variant.name) {
            return Err(CodecError::UnsupportedShape(format!(
                "enum variant '{}' must start with a capital letter",
                variant.name
            )));
        }
        if !names.insert(variant.name.as_str()) {
            return Err(CodecError::UnsupportedShape(format!(
                "duplicate enum variant '{}'",
                variant.name
            )));
        }
        if !indices.insert(variant.index) {
            return Err(CodecError::UnsupportedShape(format!(
                "duplicate constructor index {}",
                variant.index
            )));
        }
        variant.fields.iter().try_for_each(Shape::validate)?;
    }

    match enum_convention(variants) {
        EnumConvention::Boolean if variants.iter().any(|v| !v.fields.is_empty()) => Err(
            CodecError::UnsupportedShape("False/True variants cannot carry fields".into()),
        ),
        EnumConvention::Optional => {
            let some = variants.iter().find(|v| v.name == "Some");
            let none = variants.iter().find(|v| v.name == "None");
            match (some, none) {
                (Some(s), Some(n)) if s.fields.len() == 1 && n.fields.is_empty() => Ok(()),
                _ => Err(CodecError::UnsupportedShape(
                    "Some must carry exactly one field and None none".into(),
                )),
            }
        }
        _ => Ok(()),
    }
}

/// Classify a two-variant enum by its variant names
pub fn enum_convention(variants: &[ConstructorShape]) -> EnumConvention {
    if variants.len() != 2 {
        return EnumConvention::General;
    }
    let has = |name: &str| variants.iter().any(|v| v.name == name);
    if has("False") && has("True") {
        EnumConvention::Boolean
    } else if has("Some") && has("None") {
        EnumConvention::Optional
    } else {
        EnumConvention::General
    }
}

/// Sum-type discriminators must start with an ASCII capital letter
pub fn is_capitalized(name: &str) -> bool {
    name.chars().next().map_or(false, |c| c.is_ascii_uppercase())
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Integer => write!(f, "Int"),
            Shape::Bytes => write!(f, "Bytes"),
            Shape::List(items) => write!(f, "List<{}>", items),
            Shape::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Shape::Map { keys, values } => write!(f, "Map<{}, {}>", keys, values),
            Shape::Constructor(c) => write!(f, "{}#{}/{}", c.name, c.index, c.fields.len()),
            Shape::Enum(variants) => {
                let names: Vec<&str> = variants.iter().map(|v| v.name.as_str()).collect();
                write!(f, "{}", names.join(" | "))
            }
        }
    }
}
