use micropay_core::assets::{aggregate, parse_unit, AssetQuantityVector, GROUP_ID_LEN};
use micropay_core::balances::{reconcile, StaticAssetRegistry, StaticPriceFeed};
use micropay_core::codec::{decode, encode, to_cbor, Shape, Value};
use micropay_core::wallet::{sign, verify, ExtendedPrivateKey};
use proptest::prelude::*;

fn any_vector() -> impl Strategy<Value = AssetQuantityVector> {
    prop::collection::vec(("[a-f0-9]{1,8}", 0u128..1_000_000_000_000), 0..6)
        .prop_map(AssetQuantityVector::from_pairs)
}

fn int_map() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::btree_map(any::<i64>(), any::<i64>(), 0..8).prop_map(|m| m.into_iter().collect())
}

proptest! {
    #[test]
    fn encoding_is_deterministic(items in prop::collection::vec(any::<i64>(), 0..20), canonical in any::<bool>()) {
        let value = Value::List(items.iter().map(|&i| Value::int(i)).collect());
        let shape = Shape::list(Shape::Integer);
        let a = encode(&value, &shape, canonical).unwrap();
        let b = encode(&value, &shape, canonical).unwrap();
        prop_assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn canonical_maps_ignore_insertion_order(entries in int_map()) {
        let shape = Shape::map(Shape::Integer, Shape::Integer);
        let forward = Value::Map(entries.iter().map(|&(k, v)| (Value::int(k), Value::int(v))).collect());
        let backward = Value::Map(entries.iter().rev().map(|&(k, v)| (Value::int(k), Value::int(v))).collect());
        prop_assert_eq!(
            encode(&forward, &shape, true).unwrap(),
            encode(&backward, &shape, true).unwrap()
        );
    }

    #[test]
    fn decoder_reads_both_modes(items in prop::collection::vec(any::<i64>(), 0..20), bytes in prop::collection::vec(any::<u8>(), 0..200)) {
        let value = Value::List(vec![
            Value::List(items.iter().map(|&i| Value::int(i)).collect()),
            Value::bytes(&bytes),
        ]);
        let shape = Shape::Tuple(vec![Shape::list(Shape::Integer), Shape::Bytes]);
        let canonical = encode(&value, &shape, true).unwrap().to_data().unwrap();
        let default = encode(&value, &shape, false).unwrap().to_data().unwrap();
        prop_assert_eq!(&canonical, &default);
        prop_assert_eq!(decode(&to_cbor(&canonical, true)).unwrap(), canonical);
    }

    #[test]
    fn aggregate_is_order_independent(a in any_vector(), b in any_vector(), c in any_vector()) {
        let left = aggregate(&[aggregate(&[a.clone(), b.clone()]), c.clone()]);
        let right = aggregate(&[a.clone(), aggregate(&[b.clone(), c.clone()])]);
        let swapped = aggregate(&[c.clone(), a.clone(), b.clone()]);
        prop_assert_eq!(&left, &right);
        prop_assert_eq!(&left, &swapped);
        for unit in a.units().chain(b.units()).chain(c.units()) {
            let expected = a.get(unit).unwrap_or(0) + b.get(unit).unwrap_or(0) + c.get(unit).unwrap_or(0);
            prop_assert_eq!(left.get(unit), Some(expected));
        }
    }

    #[test]
    fn parse_unit_never_fails(unit in "\\PC{0,80}") {
        let parsed = parse_unit(&unit);
        let rejoined = format!("{}{}", parsed.group_id, parsed.sub_name.clone().unwrap_or_default());
        prop_assert_eq!(rejoined, unit.clone());
        prop_assert_eq!(parsed.sub_name.is_some(), unit.chars().count() >= GROUP_ID_LEN);
    }

    #[test]
    fn reconcile_never_drops_assets(l1 in any_vector(), l2 in any_vector()) {
        let snapshot = reconcile(&l1, &l2, &StaticAssetRegistry::new(), &StaticPriceFeed::new());
        let combined = aggregate(&[l1.clone(), l2.clone()]);
        prop_assert_eq!(snapshot.assets.len(), combined.len());
        prop_assert_eq!(snapshot.totals(), combined);
    }

    #[test]
    fn signatures_are_deterministic_and_verify(entropy in prop::array::uniform16(any::<u8>()), index in 0u32..1000, message in prop::collection::vec(any::<u8>(), 0..128)) {
        let key = ExtendedPrivateKey::from_entropy(&entropy, b"")
            .unwrap()
            .derive(0x8000_0000)
            .unwrap()
            .derive(index)
            .unwrap();
        let private = key.private_key();
        let a = sign(&message, &private).unwrap();
        let b = sign(&message, &private).unwrap();
        prop_assert_eq!(a, b);
        prop_assert!(verify(&message, &a, &key.public_key()));
    }
}
