//! Crypto error types.

/// Result type alias using [`CryptoError`].
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors from key handling and key agreement.
///
/// Everything here is recoverable by the caller. Contract violations by a
/// provider (wrong-length buffers, a private key that cannot yield its public
/// key) are not represented: they abort through `provider_violation`.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("{0}")]
    InvalidInputCombination(&'static str),

    #[error("peer_public_key must be X25519PublicKey, got {actual}")]
    TypeMismatch { actual: String },

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid key encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Encrypted key serialization is not supported")]
    UnsupportedEncryption,

    #[error("Unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Error computing shared key: peer public key is a low-order point")]
    NonContributory,

    #[error("Backend failure: {0}")]
    Backend(String),
}

/// Abort on a broken provider contract. Never downgraded to a `CryptoError`.
#[track_caller]
#[allow(clippy::panic)]
pub(crate) fn provider_violation(what: &str) -> ! {
    panic!("crypto provider contract violated: {what}");
}

/// View a provider-returned buffer as a fixed-size key, aborting on any other length.
#[track_caller]
pub(crate) fn expect_key_size<'a, const N: usize>(buf: &'a [u8], what: &str) -> &'a [u8; N] {
    match <&[u8; N]>::try_from(buf) {
        Ok(arr) => arr,
        Err(_) => provider_violation(&format!(
            "{what}: expected {N} bytes, got {}",
            buf.len()
        )),
    }
}
