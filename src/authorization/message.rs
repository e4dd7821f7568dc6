// Spend authorization message
//
// Constr 0 [ Constr 0 [ Value, Address ], OutputReference ]
//   Value           = Map<policy, Map<asset name, Integer>>
//   Address         = Constr 0 [ Credential, Optional<StakeCredential> ]
//   OutputReference = Constr 0 [ tx id, output index ]
//
// Field order is a wire contract with the settlement verifier.

use super::{AuthorizationError, AuthorizationResult};
use crate::assets::AssetQuantityVector;
use crate::codec::{encode, ConstructorShape, EncodedValue, Shape, Value};
use crate::types::FundReference;

pub const KEY_HASH_LEN: usize = 28;

/// Shape of the authorization message
pub fn spend_authorization_shape() -> Shape {
    let credential = Shape::Enum(vec![
        ConstructorShape::new("VerificationKey", 0, vec![Shape::Bytes]),
        ConstructorShape::new("Script", 1, vec![Shape::Bytes]),
    ]);
    let stake_credential = Shape::Enum(vec![
        ConstructorShape::new("Inline", 0, vec![credential.clone()]),
        ConstructorShape::new(
            "Pointer",
            1,
            vec![Shape::Integer, Shape::Integer, Shape::Integer],
        ),
    ]);
    let address = Shape::Constructor(ConstructorShape::new(
        "Address",
        0,
        vec![credential, Shape::optional(stake_credential)],
    ));
    let value = Shape::map(Shape::Bytes, Shape::map(Shape::Bytes, Shape::Integer));
    let output_reference = Shape::Constructor(ConstructorShape::new(
        "OutputReference",
        0,
        vec![Shape::Bytes, Shape::Integer],
    ));

    Shape::Constructor(ConstructorShape::new(
        "SpendAuthorization",
        0,
        vec![
            Shape::Constructor(ConstructorShape::new("Output", 0, vec![value, address])),
            output_reference,
        ],
    ))
}

/// Canonical bytes authorizing `amount` out of `fund` to the destination.
///
/// One key hash is a payment credential only; two are payment plus an inline
/// stake key.
pub fn build_spend_authorization<H: AsRef<[u8]>>(
    fund: &FundReference,
    amount: &AssetQuantityVector,
    destination_key_hashes: &[H],
) -> AuthorizationResult<EncodedValue> {
    if amount.is_empty() {
        return Err(AuthorizationError::InvalidInput("amount is empty".into()));
    }
    let (payment, stake) = match destination_key_hashes {
        [] => return Err(AuthorizationError::InvalidInput("no destination key hash".into())),
        [payment] => (payment.as_ref(), None),
        [payment, stake] => (payment.as_ref(), Some(stake.as_ref())),
        more => {
            return Err(AuthorizationError::InvalidInput(format!(
                "expected at most 2 destination key hashes, got {}",
                more.len()
            )))
        }
    };
    for hash in std::iter::once(payment).chain(stake) {
        if hash.len() != KEY_HASH_LEN {
            return Err(AuthorizationError::InvalidInput(format!(
                "key hash must be {} bytes, got {}",
                KEY_HASH_LEN,
                hash.len()
            )));
        }
    }
    let tx_id = fund.tx_id_bytes().map_err(AuthorizationError::InvalidInput)?;

    let value = Value::Map(
        amount
            .to_value_map()
            .map_err(AuthorizationError::InvalidInput)?
            .into_iter()
            .map(|(policy, names)| {
                let names = names
                    .into_iter()
                    .map(|(name, quantity)| (Value::Bytes(name), Value::int(quantity)))
                    .collect();
                (Value::Bytes(policy), Value::Map(names))
            })
            .collect(),
    );

    let stake_credential = match stake {
        Some(hash) => Value::variant(
            "Inline",
            vec![Value::variant("VerificationKey", vec![Value::bytes(hash)])],
        ),
        None => Value::Null,
    };
    let address = Value::List(vec![
        Value::variant("VerificationKey", vec![Value::bytes(payment)]),
        stake_credential,
    ]);

    let message = Value::List(vec![
        Value::List(vec![value, address]),
        Value::List(vec![Value::bytes(&tx_id), Value::int(fund.index)]),
    ]);

    Ok(encode(&message, &spend_authorization_shape(), true)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TX: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn fund() -> FundReference {
        FundReference::new(TX, 1)
    }

    fn lovelace(n: u128) -> AssetQuantityVector {
        AssetQuantityVector::from_pairs([("lovelace", n)])
    }

    #[test]
    fn test_payment_only_vector() {
        let encoded = build_spend_authorization(&fund(), &lovelace(1_000_000), &[[0x11u8; 28]]).unwrap();
        let expected = format!(
            "d87982d87982a140a1401a000f4240d87982d87981581c{}d87a80d879825820{}01",
            "11".repeat(28),
            "aa".repeat(32)
        );
        assert_eq!(encoded.to_hex(), expected);
    }

    #[test]
    fn test_payment_and_stake_vector() {
        let hashes = [[0x11u8; 28], [0x22u8; 28]];
        let encoded = build_spend_authorization(&fund(), &lovelace(1_000_000), &hashes).unwrap();
        let expected = format!(
            "d87982d87982a140a1401a000f4240d87982d87981581c{}d87981d87981d87981581c{}d879825820{}01",
            "11".repeat(28),
            "22".repeat(28),
            "aa".repeat(32)
        );
        assert_eq!(encoded.to_hex(), expected);
    }

    #[test]
    fn test_deterministic_across_insertion_order() {
        let policy = "ab".repeat(28);
        let token = format!("{}0014df10", policy);
        let a = AssetQuantityVector::from_pairs([("lovelace", 5u128), (token.as_str(), 7)]);
        let b = AssetQuantityVector::from_pairs([(token.as_str(), 7u128), ("lovelace", 5)]);
        let hashes = [[0x11u8; 28]];
        assert_eq!(
            build_spend_authorization(&fund(), &a, &hashes).unwrap(),
            build_spend_authorization(&fund(), &b, &hashes).unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_input_before_encoding() {
        let hash = [0x11u8; 28];
        let cases: Vec<AuthorizationResult<EncodedValue>> = vec![
            build_spend_authorization(&fund(), &AssetQuantityVector::new(), &[hash]),
            build_spend_authorization::<[u8; 28]>(&fund(), &lovelace(1), &[]),
            build_spend_authorization(&fund(), &lovelace(1), &[hash, hash, hash]),
            build_spend_authorization(&fund(), &lovelace(1), &[vec![0u8; 27]]),
            build_spend_authorization(&FundReference::new("abcd", 0), &lovelace(1), &[hash]),
        ];
        for result in cases {
            assert!(matches!(result, Err(AuthorizationError::InvalidInput(_))), "{:?}", result);
        }
    }

    #[test]
    fn test_rejects_units_outside_the_ledger_layout() {
        let hash = [[0x11u8; 28]];
        let policy = "ab".repeat(28);
        let units = [
            String::new(),
            "abcd".to_string(),
            policy.to_uppercase(),
            format!("{}0", policy),
            format!("{}00", "zz".repeat(28)),
        ];
        for unit in units {
            let amount = AssetQuantityVector::from_pairs([(unit.clone(), 1u128)]);
            let result = build_spend_authorization(&fund(), &amount, &hash);
            assert!(matches!(result, Err(AuthorizationError::InvalidInput(_))), "{}: {:?}", unit, result);
        }
    }

    #[test]
    fn test_empty_unit_does_not_merge_into_lovelace() {
        let hash = [[0x11u8; 28]];
        let split = AssetQuantityVector::from_pairs([("", 1u128), ("lovelace", 2)]);
        assert!(matches!(
            build_spend_authorization(&fund(), &split, &hash),
            Err(AuthorizationError::InvalidInput(_))
        ));
        assert!(build_spend_authorization(&fund(), &lovelace(3), &hash).is_ok());
    }

    #[test]
    fn test_full_width_quantity_is_a_bignum() {
        let encoded = build_spend_authorization(&fund(), &lovelace(u128::MAX), &[[0x11u8; 28]]).unwrap();
        let bignum = format!("a140a140c250{}", "ff".repeat(16));
        assert!(encoded.to_hex().contains(&bignum));
    }

    #[test]
    fn test_overflowed_amount_is_rejected() {
        let mut amount = lovelace(u128::MAX);
        amount.add("lovelace", 1);
        assert!(matches!(
            build_spend_authorization(&fund(), &amount, &[[0x11u8; 28]]),
            Err(AuthorizationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_shape_is_well_formed() {
        assert!(spend_authorization_shape().validate().is_ok());
    }
}
