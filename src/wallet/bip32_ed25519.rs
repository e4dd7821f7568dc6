//! BIP32-Ed25519 (Icarus, derivation scheme V2)
//!
//! Extended private key = `kL ‖ kR` (64 bytes) plus a 32-byte chain code.
//! The root is PBKDF2-HMAC-SHA512 over the phrase entropy, clamped.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::Scalar;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::derivation_path::{DerivationComponent, HARDENED};
use super::keys::{PrivateKey, PublicKey};
use super::{WalletError, WalletResult};

type HmacSha512 = Hmac<Sha512>;

const ICARUS_ITERATIONS: u32 = 4096;

/// Extended private key with chain code. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ExtendedPrivateKey {
    key: [u8; 64],
    chain_code: [u8; 32],
}

impl ExtendedPrivateKey {
    /// Icarus master key from BIP-39 entropy and an optional passphrase
    pub fn from_entropy(entropy: &[u8], passphrase: &[u8]) -> WalletResult<Self> {
        let mut stretched = Zeroizing::new([0u8; 96]);
        pbkdf2_hmac_sha512(passphrase, entropy, ICARUS_ITERATIONS, &mut stretched[..])?;

        let mut root = Self {
            key: [0u8; 64],
            chain_code: [0u8; 32],
        };
        root.key.copy_from_slice(&stretched[..64]);
        root.chain_code.copy_from_slice(&stretched[64..]);

        root.key[0] &= 0b1111_1000;
        root.key[31] &= 0b0001_1111;
        root.key[31] |= 0b0100_0000;
        Ok(root)
    }

    /// Child key; indices at or above 2^31 are hardened
    pub fn derive(&self, index: u32) -> WalletResult<Self> {
        let idx = index.to_le_bytes();
        let mut z_mac = keyed_mac(&self.chain_code)?;
        let mut c_mac = z_mac.clone();

        if index >= HARDENED {
            z_mac.update(&[0x00]);
            z_mac.update(&self.key);
            c_mac.update(&[0x01]);
            c_mac.update(&self.key);
        } else {
            let public = self.public_key_bytes();
            z_mac.update(&[0x02]);
            z_mac.update(&public);
            c_mac.update(&[0x03]);
            c_mac.update(&public);
        }
        z_mac.update(&idx);
        c_mac.update(&idx);

        let mut z = Zeroizing::new([0u8; 64]);
        z.copy_from_slice(&z_mac.finalize().into_bytes());

        let mut child = Self {
            key: [0u8; 64],
            chain_code: [0u8; 32],
        };
        add_28_mul8(&mut child.key[..32], &self.key[..32], &z[..28]);
        add_256(&mut child.key[32..], &self.key[32..], &z[32..]);
        child
            .chain_code
            .copy_from_slice(&c_mac.finalize().into_bytes()[32..]);
        Ok(child)
    }

    pub fn derive_path(&self, components: &[DerivationComponent]) -> WalletResult<Self> {
        let (first, rest) = components
            .split_first()
            .ok_or_else(|| WalletError::InvalidPath("empty derivation path".into()))?;
        let mut current = self.derive(first.full_index())?;
        for component in rest {
            current = current.derive(component.full_index())?;
        }
        Ok(current)
    }

    pub fn private_key(&self) -> PrivateKey {
        PrivateKey::from_array(&self.key)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_array(self.public_key_bytes())
    }

    pub fn public(&self) -> ExtendedPublicKey {
        ExtendedPublicKey {
            public_key: self.public_key_bytes(),
            chain_code: self.chain_code,
        }
    }

    fn public_key_bytes(&self) -> [u8; 32] {
        let mut kl = Zeroizing::new([0u8; 32]);
        kl.copy_from_slice(&self.key[..32]);
        let mut scalar = Scalar::from_bytes_mod_order(*kl);
        let point = EdwardsPoint::mul_base(&scalar).compress().to_bytes();
        scalar.zeroize();
        point
    }
}

/// Public key with chain code; supports soft derivation only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    public_key: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        if bytes.len() != 64 {
            return Err(WalletError::Derivation(format!(
                "extended public key must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut xpub = Self {
            public_key: [0u8; 32],
            chain_code: [0u8; 32],
        };
        xpub.public_key.copy_from_slice(&bytes[..32]);
        xpub.chain_code.copy_from_slice(&bytes[32..]);
        Ok(xpub)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.public_key);
        out[32..].copy_from_slice(&self.chain_code);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_array(self.public_key)
    }

    /// Soft child: `A' = A + 8·zL·B`
    pub fn derive(&self, index: u32) -> WalletResult<Self> {
        if index >= HARDENED {
            return Err(WalletError::InvalidPath(
                "hardened derivation needs the private key".into(),
            ));
        }
        let idx = index.to_le_bytes();
        let mut z_mac = keyed_mac(&self.chain_code)?;
        let mut c_mac = z_mac.clone();
        z_mac.update(&[0x02]);
        z_mac.update(&self.public_key);
        z_mac.update(&idx);
        c_mac.update(&[0x03]);
        c_mac.update(&self.public_key);
        c_mac.update(&idx);

        let z = z_mac.finalize().into_bytes();
        let mut zl8 = [0u8; 32];
        add_28_mul8(&mut zl8, &[0u8; 32], &z[..28]);

        let parent = CompressedEdwardsY(self.public_key)
            .decompress()
            .ok_or_else(|| WalletError::Derivation("public key is not a curve point".into()))?;
        let child_point = parent + EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(zl8));

        let mut child = Self {
            public_key: child_point.compress().to_bytes(),
            chain_code: [0u8; 32],
        };
        child
            .chain_code
            .copy_from_slice(&c_mac.finalize().into_bytes()[32..]);
        Ok(child)
    }
}

fn keyed_mac(key: &[u8]) -> WalletResult<HmacSha512> {
    HmacSha512::new_from_slice(key).map_err(|e| WalletError::Derivation(format!("HMAC error: {}", e)))
}

/// PBKDF2 with HMAC-SHA512 as the PRF
pub(crate) fn pbkdf2_hmac_sha512(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    out: &mut [u8],
) -> WalletResult<()> {
    let prf = keyed_mac(password)?;
    for (block, chunk) in out.chunks_mut(64).enumerate() {
        let mut mac = prf.clone();
        mac.update(salt);
        mac.update(&(block as u32 + 1).to_be_bytes());

        let mut u = Zeroizing::new([0u8; 64]);
        u.copy_from_slice(&mac.finalize().into_bytes());
        let mut t = Zeroizing::new(*u);

        for _ in 1..iterations {
            let mut mac = prf.clone();
            mac.update(&u[..]);
            u.copy_from_slice(&mac.finalize().into_bytes());
            t.iter_mut().zip(u.iter()).for_each(|(acc, b)| *acc ^= b);
        }
        chunk.copy_from_slice(&t[..chunk.len()]);
    }
    Ok(())
}

/// `out = x + 8·y` over 256-bit little-endian, `y` being 28 bytes
fn add_28_mul8(out: &mut [u8], x: &[u8], y: &[u8]) {
    let mut carry: u16 = 0;
    for i in 0..32 {
        let y8 = if i < 28 { (y[i] as u16) << 3 } else { 0 };
        let r = x[i] as u16 + y8 + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
}

/// `out = x + y mod 2^256`, little-endian
fn add_256(out: &mut [u8], x: &[u8], y: &[u8]) {
    let mut carry: u16 = 0;
    for i in 0..32 {
        let r = x[i] as u16 + y[i] as u16 + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> ExtendedPrivateKey {
        ExtendedPrivateKey::from_entropy(&[0u8; 16], b"").unwrap()
    }

    #[test]
    fn test_pbkdf2_vector() {
        let mut out = [0u8; 64];
        pbkdf2_hmac_sha512(b"password", b"salt", 1, &mut out).unwrap();
        assert_eq!(
            hex::encode(out),
            "867f70cf1ade02cff3752599a3a53dc4af34c7a669815ae5d513554e1c8cf252\
             c02d470a285a0501bad999bfe943c08f050235d7d68b1da55e63f73b60a57fce"
        );
    }

    #[test]
    fn test_root_is_clamped() {
        let key = root().private_key().to_array();
        assert_eq!(key[0] & 0b0000_0111, 0);
        assert_eq!(key[31] & 0b1110_0000, 0b0100_0000);
    }

    #[test]
    fn test_passphrase_changes_root() {
        let plain = root().public_key();
        let protected = ExtendedPrivateKey::from_entropy(&[0u8; 16], b"foo").unwrap().public_key();
        assert_ne!(plain, protected);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = root().derive(HARDENED).unwrap().derive(5).unwrap();
        let b = root().derive(HARDENED).unwrap().derive(5).unwrap();
        assert_eq!(a.public(), b.public());
        assert_ne!(a.public(), root().derive(HARDENED).unwrap().derive(6).unwrap().public());
    }

    #[test]
    fn test_soft_public_derivation_matches_private() {
        let account = root().derive(HARDENED | 1852).unwrap().derive(HARDENED).unwrap();
        for index in [0u32, 1, 42, HARDENED - 1] {
            let from_private = account.derive(index).unwrap().public_key();
            let from_public = account.public().derive(index).unwrap().public_key();
            assert_eq!(from_private, from_public, "index {}", index);
        }
    }

    #[test]
    fn test_public_hardened_derivation_rejected() {
        assert!(matches!(
            root().public().derive(HARDENED),
            Err(WalletError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_derive_path_equals_stepwise() {
        let components = [
            DerivationComponent::new(1852, true),
            DerivationComponent::new(1815, true),
            DerivationComponent::new(0, true),
        ];
        let stepwise = root()
            .derive(1852 | HARDENED)
            .unwrap()
            .derive(1815 | HARDENED)
            .unwrap()
            .derive(HARDENED)
            .unwrap();
        assert_eq!(root().derive_path(&components).unwrap().public(), stepwise.public());
    }

    #[test]
    fn test_xpub_bytes_roundtrip() {
        let xpub = root().public();
        assert_eq!(ExtendedPublicKey::from_bytes(&xpub.to_bytes()).unwrap(), xpub);
        assert!(ExtendedPublicKey::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_adders() {
        let mut out = [0u8; 32];
        add_256(&mut out, &[0xff; 32], &{
            let mut one = [0u8; 32];
            one[0] = 1;
            one
        });
        assert_eq!(out, [0u8; 32]);

        let mut out = [0u8; 32];
        let mut y = [0u8; 28];
        y[0] = 0x20;
        add_28_mul8(&mut out, &[0u8; 32], &y);
        assert_eq!(out[0], 0x00);
        assert_eq!(out[1], 0x01);
    }
}
