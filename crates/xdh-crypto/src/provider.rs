//! Crypto provider abstraction.
//!
//! Key types never do curve arithmetic themselves. They hold opaque handles
//! and hand them to a [`CryptoProvider`], which owns scalar multiplication,
//! raw export and reconstruction. [`DalekProvider`] binds the trait to
//! `x25519-dalek`.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result, expect_key_size};
use crate::serialization::{
    self, Encoding, KeySerializationEncryption, PrivateFormat, PublicFormat,
};

/// Size of X25519 private scalars, public points and shared secrets.
pub const X25519_KEY_SIZE: usize = 32;

/// Backend performing X25519 operations on opaque key handles.
///
/// Raw exports return owned buffers rather than arrays so that callers can
/// check the length contract. A native failure is an `Err`; a successful call
/// returning the wrong number of bytes is a contract violation and aborts in
/// the key types.
///
/// Handle access must be safe for concurrent reads: keys are shared across
/// threads by reference.
pub trait CryptoProvider: Clone + Send + Sync + 'static {
    type PrivateHandle: Clone + Send + Sync;
    type PublicHandle: Clone + Send + Sync;

    /// Short backend name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Generate a fresh private key from a secure random source.
    fn generate_private(&self) -> Self::PrivateHandle;

    fn private_from_raw(&self, raw: &[u8; X25519_KEY_SIZE]) -> Result<Self::PrivateHandle>;

    fn public_from_raw(&self, raw: &[u8; X25519_KEY_SIZE]) -> Result<Self::PublicHandle>;

    fn export_raw_public(&self, key: &Self::PublicHandle) -> Result<Vec<u8>>;

    fn export_raw_private(&self, key: &Self::PrivateHandle) -> Result<Zeroizing<Vec<u8>>>;

    /// Compute the public point that belongs to `key`.
    fn derive_public_from_private(&self, key: &Self::PrivateHandle) -> Result<Self::PublicHandle>;

    /// X25519 scalar multiplication of `private` with `peer` (RFC 7748 §5).
    fn ecdh_derive(
        &self,
        private: &Self::PrivateHandle,
        peer: &Self::PublicHandle,
    ) -> Result<Zeroizing<Vec<u8>>>;

    /// Structured export of a public key (SPKI in DER or PEM).
    fn export_public_encoded(
        &self,
        key: &Self::PublicHandle,
        encoding: Encoding,
        format: PublicFormat,
    ) -> Result<Vec<u8>> {
        let raw = self.export_raw_public(key)?;
        serialization::encode_public(expect_key_size(&raw, "raw public key"), encoding, format)
    }

    /// Structured export of a private key (PKCS#8 in DER or PEM).
    fn export_private_encoded(
        &self,
        key: &Self::PrivateHandle,
        encoding: Encoding,
        format: PrivateFormat,
        encryption: &KeySerializationEncryption,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let raw = self.export_raw_private(key)?;
        serialization::encode_private(
            expect_key_size(&raw, "raw private key"),
            encoding,
            format,
            encryption,
        )
    }
}

/// [`CryptoProvider`] backed by `x25519-dalek`.
///
/// Private handles are `StaticSecret`s, which zeroize themselves on drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DalekProvider;

impl CryptoProvider for DalekProvider {
    type PrivateHandle = StaticSecret;
    type PublicHandle = PublicKey;

    fn name(&self) -> &'static str {
        "x25519-dalek"
    }

    fn generate_private(&self) -> StaticSecret {
        StaticSecret::random_from_rng(OsRng)
    }

    fn private_from_raw(&self, raw: &[u8; X25519_KEY_SIZE]) -> Result<StaticSecret> {
        Ok(StaticSecret::from(*raw))
    }

    fn public_from_raw(&self, raw: &[u8; X25519_KEY_SIZE]) -> Result<PublicKey> {
        Ok(PublicKey::from(*raw))
    }

    fn export_raw_public(&self, key: &PublicKey) -> Result<Vec<u8>> {
        Ok(key.as_bytes().to_vec())
    }

    fn export_raw_private(&self, key: &StaticSecret) -> Result<Zeroizing<Vec<u8>>> {
        let bytes = Zeroizing::new(key.to_bytes());
        Ok(Zeroizing::new(bytes.to_vec()))
    }

    fn derive_public_from_private(&self, key: &StaticSecret) -> Result<PublicKey> {
        Ok(PublicKey::from(key))
    }

    fn ecdh_derive(&self, private: &StaticSecret, peer: &PublicKey) -> Result<Zeroizing<Vec<u8>>> {
        let shared = private.diffie_hellman(peer);
        // All-zero output: the peer point has small order.
        if !shared.was_contributory() {
            return Err(CryptoError::NonContributory);
        }
        Ok(Zeroizing::new(shared.as_bytes().to_vec()))
    }
}
