//! X25519 key agreement.
//!
//! The shared secret is returned exactly as the scalar multiplication
//! produced it. No KDF is applied; run it through HKDF (or whatever the
//! protocol mandates) before using it as key material.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result, expect_key_size};
use crate::keys::{AsymmetricPublicKey, KeyAlgorithm, X25519PrivateKey, X25519PublicKey};
use crate::provider::{CryptoProvider, X25519_KEY_SIZE};

/// Raw 32-byte X25519 output, wiped on drop.
#[derive(Clone)]
pub struct SharedSecret(Zeroizing<[u8; X25519_KEY_SIZE]>);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.0
    }

    /// Copy the secret out. The caller owns wiping the copy.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl AsRef<[u8]> for SharedSecret {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl Eq for SharedSecret {}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

impl<P: CryptoProvider> X25519PrivateKey<P> {
    /// Compute the X25519 shared secret with `peer_public_key`.
    ///
    /// The peer must be an [`X25519PublicKey`] bound to the same provider
    /// type; anything else fails with [`CryptoError::TypeMismatch`] before
    /// the provider is called.
    pub fn exchange(&self, peer_public_key: &dyn AsymmetricPublicKey) -> Result<SharedSecret> {
        let Some(peer) = peer_public_key
            .as_any()
            .downcast_ref::<X25519PublicKey<P>>()
        else {
            return Err(CryptoError::TypeMismatch {
                actual: describe_peer(peer_public_key),
            });
        };

        let shared = self.provider().ecdh_derive(&self.handle, &peer.handle)?;
        let shared = Zeroizing::new(*expect_key_size::<X25519_KEY_SIZE>(&shared, "shared secret"));
        tracing::trace!(provider = self.provider().name(), "computed X25519 shared secret");
        Ok(SharedSecret(shared))
    }
}

fn describe_peer(key: &dyn AsymmetricPublicKey) -> String {
    match key.algorithm() {
        KeyAlgorithm::X25519 => "X25519 public key bound to a different provider".to_owned(),
        other => format!("{other} public key"),
    }
}
