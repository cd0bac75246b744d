//! `xdh` X25519 key agreement library
//!
//! Key types for X25519 Diffie-Hellman (RFC 7748) over a pluggable crypto
//! provider, with raw and RFC 8410 DER/PEM serialization.
//!
//! ## Layout
//!
//! - **Provider**: [`CryptoProvider`] owns the curve arithmetic; [`DalekProvider`]
//!   binds it to `x25519-dalek`
//! - **Keys**: [`X25519PrivateKey`] / [`X25519PublicKey`] hold opaque provider handles
//! - **Exchange**: [`X25519PrivateKey::exchange`] returns the raw [`SharedSecret`], no KDF
//! - **Serialization**: raw 32-byte form, SubjectPublicKeyInfo and PKCS#8

pub mod error;
pub mod exchange;
pub mod keys;
pub mod provider;
pub mod serialization;

pub use error::{CryptoError, Result};
pub use exchange::SharedSecret;
pub use keys::{AsymmetricPublicKey, KeyAlgorithm, X25519PrivateKey, X25519PublicKey};
pub use provider::{CryptoProvider, DalekProvider, X25519_KEY_SIZE};
pub use serialization::{
    Encoding, ForeignPublicKey, KeySerializationEncryption, LoadedPublicKey, PrivateFormat,
    PublicFormat, load_der_private_key, load_der_public_key, load_pem_private_key,
    load_pem_public_key,
};
