//! Integration tests for the codec module

#[cfg(test)]
mod integration_tests {
    use crate::codec::*;

    fn hex_of(value: &Value, shape: &Shape, canonical: bool) -> String {
        encode(value, shape, canonical).unwrap().to_hex()
    }

    #[test]
    fn test_integer_major_types() {
        assert_eq!(hex_of(&Value::int(1), &Shape::Integer, true), "01");
        assert_eq!(hex_of(&Value::int(24), &Shape::Integer, true), "1818");
        assert_eq!(hex_of(&Value::int(-1), &Shape::Integer, true), "20");
        assert_eq!(hex_of(&Value::int(-25), &Shape::Integer, true), "3818");
        assert_eq!(hex_of(&Value::int(1_000_000), &Shape::Integer, true), "1a000f4240");
    }

    #[test]
    fn test_big_integers_are_tagged() {
        assert_eq!(
            hex_of(&Value::int(1i128 << 64), &Shape::Integer, true),
            "c249010000000000000000"
        );
        assert_eq!(
            hex_of(&Value::int(-(1i128 << 64) - 1), &Shape::Integer, true),
            "c349010000000000000000"
        );
        // u64::MAX still fits the inline form
        assert_eq!(
            hex_of(&Value::int(u64::MAX as i128), &Shape::Integer, true),
            "1bffffffffffffffff"
        );
    }

    #[test]
    fn test_bytes() {
        assert_eq!(hex_of(&Value::Bytes("cafe".into()), &Shape::Bytes, true), "42cafe");

        let long = Value::bytes(&[0u8; 65]);
        let expected = format!("5f5840{}4100ff", "00".repeat(64));
        assert_eq!(hex_of(&long, &Shape::Bytes, true), expected);
        assert_eq!(hex_of(&long, &Shape::Bytes, false), expected);
    }

    #[test]
    fn test_bytes_reject_bad_hex() {
        let err = encode(&Value::Bytes("xyz".into()), &Shape::Bytes, true).unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_list_modes() {
        let value = Value::List(vec![Value::int(1), Value::int(2)]);
        let shape = Shape::list(Shape::Integer);
        assert_eq!(hex_of(&value, &shape, false), "9f0102ff");
        assert_eq!(hex_of(&value, &shape, true), "820102");
        assert_eq!(hex_of(&Value::List(vec![]), &shape, false), "80");
    }

    #[test]
    fn test_homogeneous_list_rejects_mixed_items() {
        let value = Value::List(vec![Value::int(1), Value::Bytes("00".into())]);
        let err = encode(&value, &Shape::list(Shape::Integer), true).unwrap_err();
        match err {
            CodecError::ShapeMismatch { path, .. } => assert_eq!(path, "$[1]"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_canonical_map_sorts_by_encoded_key() {
        let shape = Shape::map(Shape::Bytes, Shape::Integer);
        let value = Value::Map(vec![
            (Value::Bytes("bb".into()), Value::int(1)),
            (Value::Bytes("aa".into()), Value::int(2)),
        ]);
        assert_eq!(hex_of(&value, &shape, true), "a241aa0241bb01");
        assert_eq!(hex_of(&value, &shape, false), "a241bb0141aa02");
    }

    #[test]
    fn test_canonical_map_insertion_order_independent() {
        let shape = Shape::map(Shape::Integer, Shape::Bytes);
        let entries = vec![
            (Value::int(500), Value::Bytes("01".into())),
            (Value::int(-3), Value::Bytes("02".into())),
            (Value::int(7), Value::Bytes("03".into())),
        ];
        let mut reversed = entries.clone();
        reversed.reverse();

        let a = encode(&Value::Map(entries), &shape, true).unwrap();
        let b = encode(&Value::Map(reversed), &shape, true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_void_constructor() {
        assert_eq!(hex_of(&Value::Unit, &Shape::void(), true), "d87980");
        assert_eq!(encode_data(&PlutusData::void(), true).to_hex(), "d87980");
    }

    #[test]
    fn test_boolean_convention() {
        let shape = Shape::boolean();
        let native_true = encode(&Value::Bool(true), &shape, true).unwrap();
        let direct_true = encode_data(&PlutusData::constr(1, vec![]), true);
        assert_eq!(native_true, direct_true);
        assert_eq!(native_true.to_hex(), "d87a80");

        let native_false = encode(&Value::Bool(false), &shape, true).unwrap();
        assert_eq!(native_false, encode_data(&PlutusData::constr(0, vec![]), true));
    }

    #[test]
    fn test_optional_convention() {
        let shape = Shape::optional(Shape::Integer);
        assert_eq!(hex_of(&Value::Null, &shape, true), "d87a80");
        assert_eq!(hex_of(&Value::int(42), &shape, true), "d87981182a");
        assert_eq!(hex_of(&Value::int(42), &shape, false), "d8799f182aff");
    }

    #[test]
    fn test_optional_index_follows_declaration_order() {
        let shape = Shape::Enum(vec![
            ConstructorShape::new("None", 0, vec![]),
            ConstructorShape::new("Some", 1, vec![Shape::Bytes]),
        ]);
        assert_eq!(hex_of(&Value::Null, &shape, true), "d87980");
        assert_eq!(hex_of(&Value::Bytes("ff".into()), &shape, true), "d87a8141ff");
    }

    #[test]
    fn test_tuple_arity_enforced() {
        let shape = Shape::Tuple(vec![Shape::Integer, Shape::Integer]);
        let three = Value::List(vec![Value::int(1), Value::int(2), Value::int(3)]);
        let err = encode(&three, &shape, true).unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));

        let two = Value::List(vec![Value::int(1), Value::int(2)]);
        assert_eq!(hex_of(&two, &shape, true), "820102");
    }

    #[test]
    fn test_constructor_field_count_enforced() {
        let shape = Shape::constructor(0, vec![Shape::Integer]);
        let err = encode(&Value::List(vec![]), &shape, true).unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));

        let err = encode(&Value::Constr { index: 1, fields: vec![Value::int(1)] }, &shape, true)
            .unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_constructor_tag_ranges() {
        let c7 = PlutusData::constr(7, vec![]);
        let c127 = PlutusData::constr(127, vec![]);
        let c128 = PlutusData::constr(128, vec![]);
        assert_eq!(encode_data(&c7, true).to_hex(), "d9050080");
        assert_eq!(encode_data(&c127, true).to_hex(), "d9057880");
        assert_eq!(encode_data(&c128, true).to_hex(), "d86682188080");
    }

    fn either_shape() -> Shape {
        Shape::Enum(vec![
            ConstructorShape::new("Left", 0, vec![Shape::Integer]),
            ConstructorShape::new("Right", 1, vec![Shape::Bytes]),
        ])
    }

    #[test]
    fn test_general_enum_dispatch() {
        let value = Value::variant("Right", vec![Value::Bytes("ab".into())]);
        assert_eq!(hex_of(&value, &either_shape(), true), "d87a8141ab");
    }

    #[test]
    fn test_general_enum_ignores_raw_constructor_index() {
        let raw = Value::Constr { index: 1, fields: vec![Value::Bytes("ab".into())] };
        match encode(&raw, &either_shape(), true).unwrap_err() {
            CodecError::ShapeMismatch { reason, .. } => assert!(reason.contains("tagged variant")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_optional_accepts_explicit_tags() {
        let nested = Shape::optional(Shape::optional(Shape::Integer));
        let some_none = Value::variant("Some", vec![Value::Null]);
        assert_eq!(hex_of(&some_none, &nested, true), "d87981d87a80");
        assert_eq!(hex_of(&Value::Null, &nested, true), "d87a80");

        let shape = Shape::optional(Shape::Integer);
        let explicit = Value::variant("Some", vec![Value::int(42)]);
        assert_eq!(hex_of(&explicit, &shape, true), hex_of(&Value::int(42), &shape, true));
        assert_eq!(hex_of(&Value::variant("None", vec![]), &shape, true), "d87a80");
    }

    #[test]
    fn test_enum_rejects_unknown_and_lowercase_tags() {
        let unknown = Value::variant("Middle", vec![]);
        assert!(matches!(
            encode(&unknown, &either_shape(), true),
            Err(CodecError::ShapeMismatch { .. })
        ));

        let lowercase = Value::variant("left", vec![Value::int(1)]);
        assert!(matches!(
            encode(&lowercase, &either_shape(), true),
            Err(CodecError::ShapeMismatch { .. })
        ));

        assert!(matches!(
            encode(&Value::int(1), &either_shape(), true),
            Err(CodecError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_shape_is_unsupported() {
        let shape = Shape::list(Shape::Enum(vec![]));
        assert!(matches!(
            encode(&Value::List(vec![]), &shape, true),
            Err(CodecError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let shape = Shape::constructor(
            0,
            vec![
                Shape::map(Shape::Bytes, Shape::map(Shape::Bytes, Shape::Integer)),
                Shape::optional(Shape::boolean()),
            ],
        );
        let value = Value::List(vec![
            Value::Map(vec![
                (
                    Value::Bytes("ff".into()),
                    Value::Map(vec![(Value::Bytes("01".into()), Value::int(5))]),
                ),
                (
                    Value::Bytes("".into()),
                    Value::Map(vec![(Value::Bytes("".into()), Value::int(2_000_000))]),
                ),
            ]),
            Value::Bool(true),
        ]);
        let first = encode(&value, &shape, true).unwrap();
        let second = encode(&value, &shape, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encoded_value_hex_roundtrip_through_decoder() {
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::integer(-7),
                PlutusData::List(vec![PlutusData::Bytes(vec![1, 2, 3])]),
            ],
        );
        let encoded = encode_data(&data, false);
        let parsed = EncodedValue::from_hex(&encoded.to_hex()).unwrap();
        assert_eq!(parsed.to_data().unwrap(), data);
        assert!(EncodedValue::from_hex("d879").is_err());
    }
}
