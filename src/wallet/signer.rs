//! Signing service: phrase + path -> keys, addresses and signatures
//!
//! Every call re-derives from the phrase; no key material is cached between
//! calls. Intermediate keys are zeroize-on-drop, so cleanup runs on every
//! return path including errors.

use secrecy::SecretString;

use super::address::base_address;
use super::bip32_ed25519::{ExtendedPrivateKey, ExtendedPublicKey};
use super::derivation_path::{DerivationComponent, DerivationPath, Role, COIN_TYPE, PURPOSE};
use super::keys::{sign, Keypair, SignedMessage};
use super::phrase::phrase_entropy;
use super::WalletResult;
use crate::config::CoreConfig;
use crate::types::Network;
use crate::log_debug;

const MODULE: &str = "wallet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningService {
    network: Network,
}

impl SigningService {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.network)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Keys and base address for `path`
    pub fn derive_keypair(&self, phrase: &SecretString, path: &DerivationPath) -> WalletResult<Keypair> {
        let account = account_key(phrase, path.account)?;

        let payment = account
            .derive(path.role.index())?
            .derive(path.index)?;
        let stake = account
            .derive(Role::Staking.index())?
            .derive(0)?;

        let public_key = payment.public_key();
        let stake_public_key = stake.public_key();
        let address = base_address(self.network, &public_key.key_hash(), &stake_public_key.key_hash())?;

        log_debug!(
            MODULE,
            "derived keypair",
            path = path,
            public_key = public_key,
            address = address
        );

        Ok(Keypair {
            path: *path,
            private_key: payment.private_key(),
            public_key,
            stake_public_key,
            address,
        })
    }

    /// Account-level extended public key (`m/1852'/1815'/account'`)
    pub fn account_public_key(&self, phrase: &SecretString, account: u32) -> WalletResult<ExtendedPublicKey> {
        // range-check the account through the path constructor
        let path = DerivationPath::payment(account)?;
        Ok(account_key(phrase, path.account)?.public())
    }

    /// Derive, sign, and return only public material
    pub fn derive_and_sign(
        &self,
        phrase: &SecretString,
        path: &DerivationPath,
        message: &[u8],
    ) -> WalletResult<SignedMessage> {
        let keypair = self.derive_keypair(phrase, path)?;
        let signature = sign(message, &keypair.private_key)?;

        log_debug!(
            MODULE,
            "signed message",
            path = path,
            public_key = keypair.public_key,
            message_len = message.len()
        );

        Ok(SignedMessage {
            public_key: keypair.public_key,
            signature,
        })
    }
}

impl Default for SigningService {
    fn default() -> Self {
        Self::new(Network::default())
    }
}

fn account_key(phrase: &SecretString, account: u32) -> WalletResult<ExtendedPrivateKey> {
    let entropy = phrase_entropy(phrase)?;
    let root = ExtendedPrivateKey::from_entropy(&entropy, b"")?;
    root.derive_path(&[
        DerivationComponent::new(PURPOSE, true),
        DerivationComponent::new(COIN_TYPE, true),
        DerivationComponent::new(account, true),
    ])
}
