//! X25519 key types.
//!
//! [`X25519PrivateKey`] and [`X25519PublicKey`] each own one provider handle
//! and nothing else. All arithmetic and encoding happens in the
//! [`CryptoProvider`]; this module checks what goes in and what comes out.

use std::any::Any;
use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result, expect_key_size, provider_violation};
use crate::provider::{CryptoProvider, DalekProvider, X25519_KEY_SIZE};
use crate::serialization::{
    self, Encoding, KeySerializationEncryption, PrivateFormat, PublicFormat,
};

/// Curve25519/Curve448 algorithms sharing the RFC 8410 encoding family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    X25519,
    X448,
    Ed25519,
    Ed448,
}

impl KeyAlgorithm {
    /// Final arc of the `1.3.101.x` object identifier.
    pub const fn oid_arc(self) -> u8 {
        match self {
            Self::X25519 => 110,
            Self::X448 => 111,
            Self::Ed25519 => 112,
            Self::Ed448 => 113,
        }
    }

    pub const fn from_oid_arc(arc: u8) -> Option<Self> {
        match arc {
            110 => Some(Self::X25519),
            111 => Some(Self::X448),
            112 => Some(Self::Ed25519),
            113 => Some(Self::Ed448),
            _ => None,
        }
    }

    /// Length of a raw public key for this algorithm.
    pub const fn public_key_size(self) -> usize {
        match self {
            Self::X25519 | Self::Ed25519 => 32,
            Self::X448 => 56,
            Self::Ed448 => 57,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::X25519 => "X25519",
            Self::X448 => "X448",
            Self::Ed25519 => "Ed25519",
            Self::Ed448 => "Ed448",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any public key this crate can hold.
///
/// [`X25519PrivateKey::exchange`] accepts this and downcasts, so keys loaded
/// from a SubjectPublicKeyInfo of another algorithm are rejected at runtime.
pub trait AsymmetricPublicKey: Send + Sync {
    fn algorithm(&self) -> KeyAlgorithm;

    fn as_any(&self) -> &dyn Any;
}

/// An X25519 public key (a Curve25519 u-coordinate).
#[derive(Clone)]
pub struct X25519PublicKey<P: CryptoProvider = DalekProvider> {
    provider: P,
    pub(crate) handle: P::PublicHandle,
}

impl X25519PublicKey {
    /// Load a public key from its 32 raw bytes.
    pub fn from_public_bytes(data: &[u8]) -> Result<Self> {
        Self::from_public_bytes_with(DalekProvider, data)
    }
}

impl<P: CryptoProvider> X25519PublicKey<P> {
    pub fn from_public_bytes_with(provider: P, data: &[u8]) -> Result<Self> {
        let raw = raw_key_bytes(data)?;
        let handle = provider.public_from_raw(raw)?;
        Ok(Self { provider, handle })
    }

    /// Serialize the public key.
    ///
    /// `Encoding::Raw` and `PublicFormat::Raw` go together and yield the
    /// 32-byte u-coordinate. Anything else is handed to the provider's
    /// structured encoder.
    pub fn public_bytes(&self, encoding: Encoding, format: PublicFormat) -> Result<Vec<u8>> {
        if serialization::wants_raw_public(encoding, format)? {
            return self.raw_public_bytes();
        }
        self.provider
            .export_public_encoded(&self.handle, encoding, format)
    }

    /// The raw 32-byte public point.
    pub fn public_bytes_raw(&self) -> Result<[u8; X25519_KEY_SIZE]> {
        let raw = self.raw_public_bytes()?;
        Ok(*expect_key_size(&raw, "raw public key"))
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn raw_public_bytes(&self) -> Result<Vec<u8>> {
        let raw = self.provider.export_raw_public(&self.handle)?;
        expect_key_size::<X25519_KEY_SIZE>(&raw, "raw public key");
        Ok(raw)
    }
}

impl<P: CryptoProvider> AsymmetricPublicKey for X25519PublicKey<P> {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::X25519
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<P: CryptoProvider> PartialEq for X25519PublicKey<P> {
    fn eq(&self, other: &Self) -> bool {
        match (self.public_bytes_raw(), other.public_bytes_raw()) {
            (Ok(a), Ok(b)) => a.as_slice().ct_eq(b.as_slice()).into(),
            _ => false,
        }
    }
}

impl<P: CryptoProvider> Eq for X25519PublicKey<P> {}

impl<P: CryptoProvider> fmt::Debug for X25519PublicKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X25519PublicKey")
            .field("bytes", &hex_or_unavailable(self.public_bytes_raw()))
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// An X25519 private key (a 32-byte Curve25519 scalar).
#[derive(Clone)]
pub struct X25519PrivateKey<P: CryptoProvider = DalekProvider> {
    provider: P,
    pub(crate) handle: P::PrivateHandle,
}

impl X25519PrivateKey {
    /// Generate a new private key from the OS random source.
    pub fn generate() -> Self {
        Self::generate_with(DalekProvider)
    }

    /// Load a private key from its 32 raw bytes.
    pub fn from_private_bytes(data: &[u8]) -> Result<Self> {
        Self::from_private_bytes_with(DalekProvider, data)
    }
}

impl<P: CryptoProvider> X25519PrivateKey<P> {
    pub fn generate_with(provider: P) -> Self {
        let handle = provider.generate_private();
        tracing::debug!(provider = provider.name(), "generated X25519 private key");
        Self { provider, handle }
    }

    pub fn from_private_bytes_with(provider: P, data: &[u8]) -> Result<Self> {
        let raw = raw_key_bytes(data)?;
        let handle = provider.private_from_raw(raw)?;
        Ok(Self { provider, handle })
    }

    /// Derive the matching public key.
    ///
    /// Recomputed from the private handle on every call.
    ///
    /// # Panics
    ///
    /// If the provider cannot derive the public key of a handle it built.
    pub fn public_key(&self) -> X25519PublicKey<P> {
        match self.provider.derive_public_from_private(&self.handle) {
            Ok(handle) => X25519PublicKey {
                provider: self.provider.clone(),
                handle,
            },
            Err(e) => provider_violation(&format!("public key derivation failed: {e}")),
        }
    }

    /// Serialize the private key.
    ///
    /// The raw form requires `Encoding::Raw`, `PrivateFormat::Raw` and
    /// [`KeySerializationEncryption::NoEncryption`] together.
    pub fn private_bytes(
        &self,
        encoding: Encoding,
        format: PrivateFormat,
        encryption: &KeySerializationEncryption,
    ) -> Result<Zeroizing<Vec<u8>>> {
        if serialization::wants_raw_private(encoding, format, encryption)? {
            return self.raw_private_bytes();
        }
        self.provider
            .export_private_encoded(&self.handle, encoding, format, encryption)
    }

    /// The raw 32-byte scalar.
    pub fn private_bytes_raw(&self) -> Result<Zeroizing<[u8; X25519_KEY_SIZE]>> {
        let raw = self.raw_private_bytes()?;
        Ok(Zeroizing::new(*expect_key_size(&raw, "raw private key")))
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn raw_private_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        let raw = self.provider.export_raw_private(&self.handle)?;
        expect_key_size::<X25519_KEY_SIZE>(&raw, "raw private key");
        Ok(raw)
    }
}

impl<P: CryptoProvider> fmt::Debug for X25519PrivateKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public = self
            .provider
            .derive_public_from_private(&self.handle)
            .and_then(|handle| self.provider.export_raw_public(&handle));
        f.debug_struct("X25519PrivateKey")
            .field("public", &hex_or_unavailable(public))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn hex_or_unavailable<T: AsRef<[u8]>>(bytes: Result<T>) -> String {
    bytes.map_or_else(|_| "<unavailable>".to_owned(), hex::encode)
}

fn raw_key_bytes(data: &[u8]) -> Result<&[u8; X25519_KEY_SIZE]> {
    <&[u8; X25519_KEY_SIZE]>::try_from(data).map_err(|_| CryptoError::InvalidKeyLength {
        expected: X25519_KEY_SIZE,
        actual: data.len(),
    })
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Provider that hands back truncated raw exports.
    #[derive(Clone, Default)]
    pub(crate) struct TruncatingProvider;

    impl CryptoProvider for TruncatingProvider {
        type PrivateHandle = <DalekProvider as CryptoProvider>::PrivateHandle;
        type PublicHandle = <DalekProvider as CryptoProvider>::PublicHandle;

        fn name(&self) -> &'static str {
            "truncating"
        }

        fn generate_private(&self) -> Self::PrivateHandle {
            DalekProvider.generate_private()
        }

        fn private_from_raw(&self, raw: &[u8; X25519_KEY_SIZE]) -> Result<Self::PrivateHandle> {
            DalekProvider.private_from_raw(raw)
        }

        fn public_from_raw(&self, raw: &[u8; X25519_KEY_SIZE]) -> Result<Self::PublicHandle> {
            DalekProvider.public_from_raw(raw)
        }

        fn export_raw_public(&self, key: &Self::PublicHandle) -> Result<Vec<u8>> {
            let mut raw = DalekProvider.export_raw_public(key)?;
            raw.truncate(31);
            Ok(raw)
        }

        fn export_raw_private(&self, key: &Self::PrivateHandle) -> Result<Zeroizing<Vec<u8>>> {
            let mut raw = DalekProvider.export_raw_private(key)?;
            raw.truncate(31);
            Ok(raw)
        }

        fn derive_public_from_private(
            &self,
            key: &Self::PrivateHandle,
        ) -> Result<Self::PublicHandle> {
            DalekProvider.derive_public_from_private(key)
        }

        fn ecdh_derive(
            &self,
            private: &Self::PrivateHandle,
            peer: &Self::PublicHandle,
        ) -> Result<Zeroizing<Vec<u8>>> {
            let mut shared = DalekProvider.ecdh_derive(private, peer)?;
            shared.truncate(31);
            Ok(shared)
        }
    }

    /// Provider whose public key derivation always fails.
    #[derive(Clone, Default)]
    struct BrokenDerivationProvider;

    impl CryptoProvider for BrokenDerivationProvider {
        type PrivateHandle = <DalekProvider as CryptoProvider>::PrivateHandle;
        type PublicHandle = <DalekProvider as CryptoProvider>::PublicHandle;

        fn name(&self) -> &'static str {
            "broken"
        }

        fn generate_private(&self) -> Self::PrivateHandle {
            DalekProvider.generate_private()
        }

        fn private_from_raw(&self, raw: &[u8; X25519_KEY_SIZE]) -> Result<Self::PrivateHandle> {
            DalekProvider.private_from_raw(raw)
        }

        fn public_from_raw(&self, raw: &[u8; X25519_KEY_SIZE]) -> Result<Self::PublicHandle> {
            DalekProvider.public_from_raw(raw)
        }

        fn export_raw_public(&self, key: &Self::PublicHandle) -> Result<Vec<u8>> {
            DalekProvider.export_raw_public(key)
        }

        fn export_raw_private(&self, key: &Self::PrivateHandle) -> Result<Zeroizing<Vec<u8>>> {
            DalekProvider.export_raw_private(key)
        }

        fn derive_public_from_private(
            &self,
            _key: &Self::PrivateHandle,
        ) -> Result<Self::PublicHandle> {
            Err(CryptoError::Backend("derive failed".into()))
        }

        fn ecdh_derive(
            &self,
            private: &Self::PrivateHandle,
            peer: &Self::PublicHandle,
        ) -> Result<Zeroizing<Vec<u8>>> {
            DalekProvider.ecdh_derive(private, peer)
        }
    }

    fn raw_private(key: &X25519PrivateKey) -> Zeroizing<Vec<u8>> {
        key.private_bytes(Encoding::Raw, PrivateFormat::Raw, &KeySerializationEncryption::NoEncryption)
            .unwrap()
    }

    #[test]
    fn raw_private_roundtrip() {
        let scalar: Vec<u8> = (0u8..32).collect();
        let key = X25519PrivateKey::from_private_bytes(&scalar).unwrap();
        assert_eq!(raw_private(&key).as_slice(), scalar.as_slice());
        assert_eq!(key.private_bytes_raw().unwrap().as_slice(), scalar.as_slice());
    }

    #[test]
    fn raw_public_roundtrip() {
        let public = X25519PrivateKey::generate().public_key();
        let raw = public.public_bytes(Encoding::Raw, PublicFormat::Raw).unwrap();
        assert_eq!(raw.len(), X25519_KEY_SIZE);

        let reloaded = X25519PublicKey::from_public_bytes(&raw).unwrap();
        assert_eq!(reloaded, public);
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        for len in [0, 16, 31, 33, 64] {
            let data = vec![7u8; len];
            let err = X25519PrivateKey::from_private_bytes(&data).unwrap_err();
            assert!(
                matches!(err, CryptoError::InvalidKeyLength { expected: 32, actual } if actual == len),
                "private, len {len}: {err:?}"
            );
            let err = X25519PublicKey::from_public_bytes(&data).unwrap_err();
            assert!(
                matches!(err, CryptoError::InvalidKeyLength { expected: 32, actual } if actual == len),
                "public, len {len}: {err:?}"
            );
        }
    }

    #[test]
    fn public_key_derivation_is_deterministic() {
        let key = X25519PrivateKey::generate();
        let a = key.public_key().public_bytes_raw().unwrap();
        let b = key.public_key().public_bytes_raw().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn public_bytes_rejects_half_raw() {
        let public = X25519PrivateKey::generate().public_key();
        for (encoding, format) in [
            (Encoding::Raw, PublicFormat::SubjectPublicKeyInfo),
            (Encoding::Der, PublicFormat::Raw),
            (Encoding::Pem, PublicFormat::Raw),
        ] {
            let err = public.public_bytes(encoding, format).unwrap_err();
            match err {
                CryptoError::InvalidInputCombination(msg) => {
                    assert_eq!(msg, "When using Raw both encoding and format must be Raw");
                }
                other => panic!("{encoding:?}/{format:?}: wrong error {other:?}"),
            }
        }
    }

    #[test]
    fn private_bytes_rejects_encrypted_raw() {
        let key = X25519PrivateKey::generate();
        let encryption = KeySerializationEncryption::best_available(b"hunter2").unwrap();
        let err = key
            .private_bytes(Encoding::Raw, PrivateFormat::Raw, &encryption)
            .unwrap_err();
        match err {
            CryptoError::InvalidInputCombination(msg) => assert_eq!(
                msg,
                "When using Raw both encoding and format must be Raw and encryption_algorithm must be NoEncryption()"
            ),
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn private_bytes_rejects_half_raw() {
        let key = X25519PrivateKey::generate();
        let none = KeySerializationEncryption::NoEncryption;
        for (encoding, format) in [
            (Encoding::Raw, PrivateFormat::Pkcs8),
            (Encoding::Pem, PrivateFormat::Raw),
            (Encoding::Der, PrivateFormat::Raw),
        ] {
            assert!(matches!(
                key.private_bytes(encoding, format, &none),
                Err(CryptoError::InvalidInputCombination(_))
            ));
        }
    }

    #[test]
    fn structured_export_goes_through_provider() {
        let key = X25519PrivateKey::generate();
        let der = key
            .private_bytes(
                Encoding::Der,
                PrivateFormat::Pkcs8,
                &KeySerializationEncryption::NoEncryption,
            )
            .unwrap();
        assert_eq!(der.len(), 48);
        assert_eq!(&der[16..], key.private_bytes_raw().unwrap().as_slice());

        let spki = key
            .public_key()
            .public_bytes(Encoding::Der, PublicFormat::SubjectPublicKeyInfo)
            .unwrap();
        assert_eq!(spki.len(), 44);
        assert_eq!(&spki[12..], &key.public_key().public_bytes_raw().unwrap());
    }

    #[test]
    fn debug_impl_redacts_secret() {
        let key = X25519PrivateKey::generate();
        let debug_output = format!("{key:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(&hex::encode(key.private_bytes_raw().unwrap().as_slice())));
    }

    #[test]
    fn public_keys_compare_by_value() {
        let key = X25519PrivateKey::generate();
        assert_eq!(key.public_key(), key.public_key());
        assert_ne!(key.public_key(), X25519PrivateKey::generate().public_key());
    }

    #[test]
    fn keys_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<X25519PrivateKey>();
        assert_send_sync::<X25519PublicKey>();
    }

    #[test]
    fn keys_can_be_shared_across_threads() {
        let key = std::sync::Arc::new(X25519PrivateKey::generate());
        let expected = key.public_key().public_bytes_raw().unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let key = std::sync::Arc::clone(&key);
                std::thread::spawn(move || key.public_key().public_bytes_raw().unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    #[should_panic(expected = "crypto provider contract violated")]
    fn truncated_public_export_aborts() {
        let key = X25519PrivateKey::generate_with(TruncatingProvider);
        let _ = key.public_key().public_bytes(Encoding::Raw, PublicFormat::Raw);
    }

    #[test]
    #[should_panic(expected = "crypto provider contract violated")]
    fn truncated_private_export_aborts() {
        let key = X25519PrivateKey::generate_with(TruncatingProvider);
        let _ = key.private_bytes(
            Encoding::Raw,
            PrivateFormat::Raw,
            &KeySerializationEncryption::NoEncryption,
        );
    }

    #[test]
    #[should_panic(expected = "public key derivation failed")]
    fn failed_derivation_aborts() {
        let key = X25519PrivateKey::generate_with(BrokenDerivationProvider);
        let _ = key.public_key();
    }
}
