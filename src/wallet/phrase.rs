//! Recovery phrase validation and generation

use bip39::Mnemonic;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use super::{WalletError, WalletResult};

pub const SUPPORTED_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Check a phrase without deriving anything from it
pub fn validate_phrase(phrase: &SecretString) -> WalletResult<()> {
    phrase_entropy(phrase).map(|_| ())
}

/// Normalize (NFKD, lowercase, single spaces), check the word count, then the
/// word list and checksum. Returns the phrase entropy.
pub(crate) fn phrase_entropy(phrase: &SecretString) -> WalletResult<Zeroizing<Vec<u8>>> {
    let decomposed = Zeroizing::new(phrase.expose_secret().nfkd().collect::<String>());
    let normalized = Zeroizing::new(decomposed.to_lowercase());

    let count = normalized.split_whitespace().count();
    if !SUPPORTED_WORD_COUNTS.contains(&count) {
        return Err(WalletError::InvalidPhrase(format!(
            "expected 12, 15, 18, 21 or 24 words, got {}",
            count
        )));
    }

    let joined = Zeroizing::new(normalized.split_whitespace().collect::<Vec<_>>().join(" "));
    let mnemonic = Mnemonic::parse_normalized(&joined).map_err(|e| {
        let reason = match e {
            bip39::Error::UnknownWord(i) => format!("word {} is not in the word list", i + 1),
            bip39::Error::InvalidChecksum => "checksum does not match".to_string(),
            _ => "not a valid BIP-39 phrase".to_string(),
        };
        WalletError::InvalidPhrase(reason)
    })?;

    Ok(Zeroizing::new(mnemonic.to_entropy()))
}

/// Generate a fresh phrase from OS entropy
pub fn generate_phrase(word_count: usize) -> WalletResult<SecretString> {
    if !SUPPORTED_WORD_COUNTS.contains(&word_count) {
        return Err(WalletError::InvalidPhrase(format!(
            "cannot generate a {}-word phrase",
            word_count
        )));
    }

    // 32 bits of entropy per 3 words
    let mut entropy = Zeroizing::new(vec![0u8; word_count * 4 / 3]);
    OsRng.fill_bytes(entropy.as_mut_slice());

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| WalletError::Derivation(format!("failed to encode entropy: {}", e)))?;
    Ok(SecretString::from(mnemonic.to_string()))
}
