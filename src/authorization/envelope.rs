// Settlement envelope: signed spend authorization in the JSON form the
// settlement service accepts

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::message::build_spend_authorization;
use super::AuthorizationResult;
use crate::assets::{AssetId, AssetQuantityVector, QuantityValue};
use crate::types::FundReference;
use crate::wallet::{address_key_hashes, DerivationPath, PublicKey, Signature, SigningService};
use crate::log_info;

const MODULE: &str = "authorization";

/// Role-specific destination of an authorized spend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpendRole {
    /// Move funds back to the holder's own address
    Withdraw { address: String },
    /// Pay a merchant
    Pay { merchant_address: String },
}

impl SpendRole {
    pub fn destination(&self) -> &str {
        match self {
            SpendRole::Withdraw { address } => address,
            SpendRole::Pay { merchant_address } => merchant_address,
        }
    }
}

/// What to authorize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRequest {
    pub fund: FundReference,
    pub amount: AssetQuantityVector,
    #[serde(flatten)]
    pub role: SpendRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEnvelope {
    pub signature: Signature,
    pub amount: Vec<(AssetId, QuantityValue)>,
    pub funds_utxo_ref: FundReference,
    pub public_key: PublicKey,
    #[serde(flatten)]
    pub role: SpendRole,
}

/// Build the message for `request`, sign it with the key at `path`, and
/// package the result. The destination key hashes come from the role address.
pub fn authorize_spend(
    service: &SigningService,
    phrase: &SecretString,
    path: &DerivationPath,
    request: &SpendRequest,
) -> AuthorizationResult<SettlementEnvelope> {
    let hashes = address_key_hashes(request.role.destination())?;
    let mut destination = vec![hashes.payment.to_vec()];
    destination.extend(hashes.stake.map(|stake| stake.to_vec()));

    let message = build_spend_authorization(&request.fund, &request.amount, &destination)?;
    let signed = service.derive_and_sign(phrase, path, message.as_bytes())?;

    log_info!(
        MODULE,
        "spend authorized",
        fund = request.fund,
        destination = request.role.destination(),
        assets = request.amount.len()
    );

    Ok(SettlementEnvelope {
        signature: signed.signature,
        amount: request
            .amount
            .iter()
            .map(|(unit, quantity)| (unit.clone(), QuantityValue(*quantity)))
            .collect(),
        funds_utxo_ref: request.fund.clone(),
        public_key: signed.public_key,
        role: request.role.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::AuthorizationError;
    use crate::types::Network;
    use crate::wallet::{verify, WalletError};

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const TX: &str = "0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f";

    fn phrase() -> SecretString {
        SecretString::from(ABANDON_ABOUT.to_string())
    }

    fn merchant(service: &SigningService) -> String {
        let path = DerivationPath::payment(7).unwrap();
        service.derive_keypair(&phrase(), &path).unwrap().address
    }

    fn request(role: SpendRole) -> SpendRequest {
        SpendRequest {
            fund: FundReference::new(TX, 0),
            amount: AssetQuantityVector::from_pairs([("lovelace", 2_000_000u128)]),
            role,
        }
    }

    #[test]
    fn test_envelope_signature_covers_message() {
        let service = SigningService::new(Network::Preprod);
        let path = DerivationPath::payment(0).unwrap();
        let merchant_address = merchant(&service);
        let request = request(SpendRole::Pay {
            merchant_address: merchant_address.clone(),
        });

        let envelope = authorize_spend(&service, &phrase(), &path, &request).unwrap();

        let hashes = address_key_hashes(&merchant_address).unwrap();
        let message = build_spend_authorization(
            &request.fund,
            &request.amount,
            &[hashes.payment.to_vec(), hashes.stake.unwrap().to_vec()],
        )
        .unwrap();
        assert!(verify(message.as_bytes(), &envelope.signature, &envelope.public_key));
    }

    #[test]
    fn test_envelope_json_layout() {
        let service = SigningService::default();
        let path = DerivationPath::payment(0).unwrap();
        let address = merchant(&service);
        let envelope = authorize_spend(
            &service,
            &phrase(),
            &path,
            &request(SpendRole::Withdraw { address: address.clone() }),
        )
        .unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["amount"], serde_json::json!([["lovelace", 2_000_000]]));
        assert_eq!(json["funds_utxo_ref"], serde_json::json!({"hash": TX, "index": 0}));
        assert_eq!(json["address"], serde_json::json!(address));
        assert!(json.get("merchant_address").is_none());
        assert_eq!(json["signature"].as_str().unwrap().len(), 128);

        let back: SettlementEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_pay_role_roundtrip() {
        let json = serde_json::json!({
            "fund": {"hash": TX, "index": 3},
            "amount": {"lovelace": "10"},
            "merchant_address": "addr_test1xyz"
        });
        let request: SpendRequest = serde_json::from_value(json).unwrap();
        assert_eq!(
            request.role,
            SpendRole::Pay {
                merchant_address: "addr_test1xyz".into()
            }
        );
        assert_eq!(request.amount.get("lovelace"), Some(10));
    }

    #[test]
    fn test_bad_destination_and_phrase() {
        let service = SigningService::default();
        let path = DerivationPath::payment(0).unwrap();

        let bad_address = request(SpendRole::Pay {
            merchant_address: "not-an-address".into(),
        });
        assert!(matches!(
            authorize_spend(&service, &phrase(), &path, &bad_address),
            Err(AuthorizationError::Wallet(WalletError::InvalidAddress(_)))
        ));

        let good = request(SpendRole::Withdraw {
            address: merchant(&service),
        });
        let short = SecretString::from("abandon abandon".to_string());
        assert!(matches!(
            authorize_spend(&service, &short, &path, &good),
            Err(AuthorizationError::Wallet(WalletError::InvalidPhrase(_)))
        ));
    }
}
