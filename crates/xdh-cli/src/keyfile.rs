//! Key file handling.
//!
//! Key files hold a single X25519 key as PEM (RFC 8410), DER, or the bare
//! 32 bytes. The encoding is detected on load. Private key files are created
//! owner-only and refused on Unix when group or world can read them.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use xdh_crypto::{
    CryptoError, Encoding, KeySerializationEncryption, PrivateFormat, PublicFormat,
    X25519_KEY_SIZE, X25519PrivateKey, X25519PublicKey,
};
use zeroize::Zeroizing;

/// On-disk key encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    Pem,
    Der,
    Raw,
}

impl KeyEncoding {
    /// Guess the encoding of a key file's contents.
    pub fn detect(data: &[u8]) -> Self {
        if data.trim_ascii_start().starts_with(b"-----BEGIN") {
            Self::Pem
        } else if data.len() == X25519_KEY_SIZE {
            Self::Raw
        } else {
            Self::Der
        }
    }

    /// Whether this encoding is printable as-is.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Pem)
    }
}

pub fn encode_private(
    key: &X25519PrivateKey,
    encoding: KeyEncoding,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let none = KeySerializationEncryption::NoEncryption;
    match encoding {
        KeyEncoding::Pem => key.private_bytes(Encoding::Pem, PrivateFormat::Pkcs8, &none),
        KeyEncoding::Der => key.private_bytes(Encoding::Der, PrivateFormat::Pkcs8, &none),
        KeyEncoding::Raw => key.private_bytes(Encoding::Raw, PrivateFormat::Raw, &none),
    }
}

pub fn encode_public(key: &X25519PublicKey, encoding: KeyEncoding) -> Result<Vec<u8>, CryptoError> {
    match encoding {
        KeyEncoding::Pem => key.public_bytes(Encoding::Pem, PublicFormat::SubjectPublicKeyInfo),
        KeyEncoding::Der => key.public_bytes(Encoding::Der, PublicFormat::SubjectPublicKeyInfo),
        KeyEncoding::Raw => key.public_bytes(Encoding::Raw, PublicFormat::Raw),
    }
}

pub fn decode_private(data: &[u8]) -> Result<X25519PrivateKey, CryptoError> {
    match KeyEncoding::detect(data) {
        KeyEncoding::Pem => xdh_crypto::load_pem_private_key(data, None),
        KeyEncoding::Der => xdh_crypto::load_der_private_key(data, None),
        KeyEncoding::Raw => X25519PrivateKey::from_private_bytes(data),
    }
}

pub fn decode_public(data: &[u8]) -> Result<X25519PublicKey, CryptoError> {
    match KeyEncoding::detect(data) {
        KeyEncoding::Pem => xdh_crypto::load_pem_public_key(data)?.into_x25519(),
        KeyEncoding::Der => xdh_crypto::load_der_public_key(data)?.into_x25519(),
        KeyEncoding::Raw => X25519PublicKey::from_public_bytes(data),
    }
}

/// Write a private key file readable only by its owner.
pub fn save_private_key(path: &Path, key: &X25519PrivateKey, encoding: KeyEncoding) -> Result<()> {
    let bytes = encode_private(key, encoding)?;
    create_parent_dir(path)?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    // An existing file keeps its old mode through `open`.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(&bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), ?encoding, "wrote private key");
    Ok(())
}

/// Load a private key file, auto-detecting its encoding.
pub fn load_private_key(path: &Path) -> Result<X25519PrivateKey> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            bail!(
                "private key file {} has insecure permissions: {mode:o} (expected 600)",
                path.display()
            );
        }
    }

    let data = Zeroizing::new(
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?,
    );
    let key = decode_private(&data)
        .with_context(|| format!("{} is not an X25519 private key", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded private key");
    Ok(key)
}

pub fn save_public_key(path: &Path, key: &X25519PublicKey, encoding: KeyEncoding) -> Result<()> {
    let bytes = encode_public(key, encoding)?;
    create_parent_dir(path)?;
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?encoding, "wrote public key");
    Ok(())
}

pub fn load_public_key(path: &Path) -> Result<X25519PublicKey> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_public(&data).with_context(|| format!("{} is not an X25519 public key", path.display()))
}

fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display())),
        _ => Ok(()),
    }
}
