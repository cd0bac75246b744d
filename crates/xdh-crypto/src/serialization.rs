//! Key serialization parameters and the RFC 8410 encodings.
//!
//! Only the fixed X25519 shapes are produced: SubjectPublicKeyInfo for
//! public keys and unencrypted PKCS#8 v1 for private keys, as DER or PEM.
//! Loaders recognise SPKI for the whole `1.3.101.x` family so that a key of
//! the wrong algorithm surfaces as a typed key rather than a parse error.
//!
//! Parsing matches the fixed RFC 8410 byte layouts, not general DER. PKCS#8
//! v2 (`OneAsymmetricKey` carrying the `[1]` public key), private key
//! attributes and long-form lengths are rejected with
//! [`CryptoError::InvalidEncoding`]. An `EncryptedPrivateKeyInfo` is
//! recognised by shape and reported as encrypted.

use std::fmt;

use pem::{EncodeConfig, LineEnding, Pem};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CryptoError, Result};
use crate::keys::{AsymmetricPublicKey, KeyAlgorithm, X25519PrivateKey, X25519PublicKey};
use crate::provider::{CryptoProvider, DalekProvider, X25519_KEY_SIZE};

const RAW_PUBLIC_COMBINATION: &str = "When using Raw both encoding and format must be Raw";
const RAW_PRIVATE_COMBINATION: &str = "When using Raw both encoding and format must be Raw and encryption_algorithm must be NoEncryption()";

const PEM_PUBLIC_LABEL: &str = "PUBLIC KEY";
const PEM_PRIVATE_LABEL: &str = "PRIVATE KEY";
const PEM_ENCRYPTED_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// `SEQUENCE { SEQUENCE { OID 1.3.101.110 }, BIT STRING (0 unused bits) }`
const SPKI_X25519_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];

/// `SEQUENCE { INTEGER 0, SEQUENCE { OID 1.3.101.110 }, OCTET STRING { OCTET STRING } }`
const PKCS8_X25519_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x04, 0x22, 0x04, 0x20,
];

/// Outer container encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Pem,
    Der,
    OpenSsh,
    Raw,
    X962,
}

/// Public key structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicFormat {
    SubjectPublicKeyInfo,
    Pkcs1,
    OpenSsh,
    Raw,
    CompressedPoint,
    UncompressedPoint,
}

/// Private key structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivateFormat {
    Pkcs8,
    TraditionalOpenSsl,
    OpenSsh,
    Raw,
}

/// How an exported private key is protected.
#[derive(Clone)]
pub enum KeySerializationEncryption {
    NoEncryption,
    /// Password-based encryption with the best scheme available.
    BestAvailableEncryption(Zeroizing<Vec<u8>>),
}

impl KeySerializationEncryption {
    pub fn best_available(password: &[u8]) -> Result<Self> {
        if password.is_empty() {
            return Err(CryptoError::InvalidInput(
                "password must be 1 or more bytes".into(),
            ));
        }
        Ok(Self::BestAvailableEncryption(Zeroizing::new(password.to_vec())))
    }

    pub const fn is_none(&self) -> bool {
        matches!(self, Self::NoEncryption)
    }
}

impl fmt::Debug for KeySerializationEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEncryption => f.write_str("NoEncryption"),
            Self::BestAvailableEncryption(_) => f.write_str("BestAvailableEncryption([REDACTED])"),
        }
    }
}

/// Whether a public export takes the raw path.
///
/// Raw encoding and Raw format are only meaningful together; asking for one
/// without the other is an error.
pub(crate) fn wants_raw_public(encoding: Encoding, format: PublicFormat) -> Result<bool> {
    match (encoding == Encoding::Raw, format == PublicFormat::Raw) {
        (true, true) => Ok(true),
        (false, false) => Ok(false),
        _ => Err(CryptoError::InvalidInputCombination(RAW_PUBLIC_COMBINATION)),
    }
}

/// Whether a private export takes the raw path. Raw is never encrypted.
pub(crate) fn wants_raw_private(
    encoding: Encoding,
    format: PrivateFormat,
    encryption: &KeySerializationEncryption,
) -> Result<bool> {
    if encoding != Encoding::Raw && format != PrivateFormat::Raw {
        return Ok(false);
    }
    if encoding == Encoding::Raw && format == PrivateFormat::Raw && encryption.is_none() {
        return Ok(true);
    }
    Err(CryptoError::InvalidInputCombination(RAW_PRIVATE_COMBINATION))
}

pub(crate) fn encode_public(
    raw: &[u8; X25519_KEY_SIZE],
    encoding: Encoding,
    format: PublicFormat,
) -> Result<Vec<u8>> {
    match format {
        PublicFormat::SubjectPublicKeyInfo => {}
        PublicFormat::Raw => {
            return Err(CryptoError::InvalidInputCombination(RAW_PUBLIC_COMBINATION));
        }
        other => {
            return Err(CryptoError::UnsupportedFormat(format!(
                "{other:?} is invalid with an X25519 key"
            )));
        }
    }

    let mut der = Vec::with_capacity(SPKI_X25519_PREFIX.len() + X25519_KEY_SIZE);
    der.extend_from_slice(&SPKI_X25519_PREFIX);
    der.extend_from_slice(raw);

    match encoding {
        Encoding::Der => Ok(der),
        Encoding::Pem => Ok(pem_armor(PEM_PUBLIC_LABEL, der).into_bytes()),
        Encoding::Raw => Err(CryptoError::InvalidInputCombination(RAW_PUBLIC_COMBINATION)),
        other => Err(unsupported_encoding(other)),
    }
}

pub(crate) fn encode_private(
    raw: &[u8; X25519_KEY_SIZE],
    encoding: Encoding,
    format: PrivateFormat,
    encryption: &KeySerializationEncryption,
) -> Result<Zeroizing<Vec<u8>>> {
    match format {
        PrivateFormat::Pkcs8 => {}
        PrivateFormat::Raw => {
            return Err(CryptoError::InvalidInputCombination(RAW_PRIVATE_COMBINATION));
        }
        other => {
            return Err(CryptoError::UnsupportedFormat(format!(
                "{other:?} is invalid with an X25519 key"
            )));
        }
    }
    if !encryption.is_none() {
        return Err(CryptoError::UnsupportedEncryption);
    }

    let mut der = Zeroizing::new(Vec::with_capacity(
        PKCS8_X25519_PREFIX.len() + X25519_KEY_SIZE,
    ));
    der.extend_from_slice(&PKCS8_X25519_PREFIX);
    der.extend_from_slice(raw);

    match encoding {
        Encoding::Der => Ok(der),
        Encoding::Pem => Ok(Zeroizing::new(
            pem_armor(PEM_PRIVATE_LABEL, der.to_vec()).into_bytes(),
        )),
        Encoding::Raw => Err(CryptoError::InvalidInputCombination(RAW_PRIVATE_COMBINATION)),
        other => Err(unsupported_encoding(other)),
    }
}

fn unsupported_encoding(encoding: Encoding) -> CryptoError {
    CryptoError::UnsupportedFormat(format!(
        "{encoding:?} encoding is invalid with an X25519 key"
    ))
}

/// PEM-armor `der`, wiping the intermediate copy held by the `Pem`.
fn pem_armor(label: &str, der: Vec<u8>) -> String {
    let pem = Pem::new(label, der);
    let text = pem::encode_config(&pem, EncodeConfig::new().set_line_ending(LineEnding::LF));
    pem.into_contents().zeroize();
    text
}

/// A public key of an RFC 8410 algorithm this crate does not operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignPublicKey {
    algorithm: KeyAlgorithm,
    bytes: Vec<u8>,
}

impl ForeignPublicKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsymmetricPublicKey for ForeignPublicKey {
    fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Result of decoding a SubjectPublicKeyInfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedPublicKey<P: CryptoProvider = DalekProvider> {
    X25519(X25519PublicKey<P>),
    Other(ForeignPublicKey),
}

impl<P: CryptoProvider> LoadedPublicKey<P> {
    pub fn into_x25519(self) -> Result<X25519PublicKey<P>> {
        match self {
            Self::X25519(key) => Ok(key),
            Self::Other(key) => Err(CryptoError::TypeMismatch {
                actual: format!("{} public key", key.algorithm),
            }),
        }
    }
}

impl<P: CryptoProvider> AsymmetricPublicKey for LoadedPublicKey<P> {
    fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::X25519(key) => key.algorithm(),
            Self::Other(key) => key.algorithm(),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        match self {
            Self::X25519(key) => key.as_any(),
            Self::Other(key) => key.as_any(),
        }
    }
}

pub fn load_der_public_key(data: &[u8]) -> Result<LoadedPublicKey> {
    load_der_public_key_with(DalekProvider, data)
}

pub fn load_der_public_key_with<P: CryptoProvider>(
    provider: P,
    data: &[u8],
) -> Result<LoadedPublicKey<P>> {
    let (algorithm, key) = parse_spki(data)?;
    tracing::debug!(%algorithm, "decoded SubjectPublicKeyInfo");
    if algorithm == KeyAlgorithm::X25519 {
        X25519PublicKey::from_public_bytes_with(provider, key).map(LoadedPublicKey::X25519)
    } else {
        Ok(LoadedPublicKey::Other(ForeignPublicKey {
            algorithm,
            bytes: key.to_vec(),
        }))
    }
}

pub fn load_pem_public_key(data: &[u8]) -> Result<LoadedPublicKey> {
    load_pem_public_key_with(DalekProvider, data)
}

pub fn load_pem_public_key_with<P: CryptoProvider>(
    provider: P,
    data: &[u8],
) -> Result<LoadedPublicKey<P>> {
    let pem = parse_pem(data)?;
    if pem.tag() != PEM_PUBLIC_LABEL {
        return Err(CryptoError::InvalidEncoding(format!(
            "unexpected PEM label {:?}, expected {PEM_PUBLIC_LABEL:?}",
            pem.tag()
        )));
    }
    load_der_public_key_with(provider, pem.contents())
}

/// Decode an unencrypted PKCS#8 X25519 private key.
///
/// An `EncryptedPrivateKeyInfo` fails with [`CryptoError::UnsupportedEncryption`]
/// when `password` is given. Otherwise `password` must be `None`.
pub fn load_der_private_key(data: &[u8], password: Option<&[u8]>) -> Result<X25519PrivateKey> {
    load_der_private_key_with(DalekProvider, data, password)
}

pub fn load_der_private_key_with<P: CryptoProvider>(
    provider: P,
    data: &[u8],
    password: Option<&[u8]>,
) -> Result<X25519PrivateKey<P>> {
    if is_encrypted_pkcs8(data) {
        return Err(match password {
            Some(_) => CryptoError::UnsupportedEncryption,
            None => CryptoError::InvalidInput(
                "password was not given but private key is encrypted".into(),
            ),
        });
    }
    if password.is_some() {
        return Err(CryptoError::InvalidInput(
            "password was given but private key is not encrypted".into(),
        ));
    }
    let scalar = parse_pkcs8(data)?;
    X25519PrivateKey::from_private_bytes_with(provider, scalar)
}

pub fn load_pem_private_key(data: &[u8], password: Option<&[u8]>) -> Result<X25519PrivateKey> {
    load_pem_private_key_with(DalekProvider, data, password)
}

pub fn load_pem_private_key_with<P: CryptoProvider>(
    provider: P,
    data: &[u8],
    password: Option<&[u8]>,
) -> Result<X25519PrivateKey<P>> {
    let pem = parse_pem(data)?;
    match pem.tag() {
        PEM_PRIVATE_LABEL => {}
        PEM_ENCRYPTED_LABEL if password.is_none() => {
            return Err(CryptoError::InvalidInput(
                "password was not given but private key is encrypted".into(),
            ));
        }
        PEM_ENCRYPTED_LABEL => return Err(CryptoError::UnsupportedEncryption),
        other => {
            return Err(CryptoError::InvalidEncoding(format!(
                "unexpected PEM label {other:?}, expected {PEM_PRIVATE_LABEL:?}"
            )));
        }
    }
    let der = Zeroizing::new(pem.into_contents());
    load_der_private_key_with(provider, &der, password)
}

fn parse_pem(data: &[u8]) -> Result<Pem> {
    pem::parse(data).map_err(|e| CryptoError::InvalidEncoding(format!("failed to parse PEM: {e}")))
}

/// `EncryptedPrivateKeyInfo` opens with an AlgorithmIdentifier SEQUENCE
/// where `PrivateKeyInfo` has its INTEGER version.
fn is_encrypted_pkcs8(der: &[u8]) -> bool {
    let [0x30, len, rest @ ..] = der else {
        return false;
    };
    let skip = if len & 0x80 == 0 {
        0
    } else {
        usize::from(len & 0x7f)
    };
    rest.get(skip) == Some(&0x30)
}

/// Split an RFC 8410 SubjectPublicKeyInfo into algorithm and key bytes.
///
/// Only the short-form lengths these keys use are accepted.
fn parse_spki(der: &[u8]) -> Result<(KeyAlgorithm, &[u8])> {
    let [
        0x30,
        outer_len,
        0x30,
        0x05,
        0x06,
        0x03,
        0x2b,
        0x65,
        arc,
        0x03,
        bits_len,
        0x00,
        key @ ..,
    ] = der
    else {
        return Err(CryptoError::InvalidEncoding(
            "not an RFC 8410 SubjectPublicKeyInfo".into(),
        ));
    };
    if usize::from(*outer_len) != der.len() - 2 || usize::from(*bits_len) != key.len() + 1 {
        return Err(CryptoError::InvalidEncoding(
            "SubjectPublicKeyInfo length mismatch".into(),
        ));
    }
    let algorithm = KeyAlgorithm::from_oid_arc(*arc)
        .ok_or_else(|| CryptoError::UnsupportedAlgorithm(format!("OID 1.3.101.{arc}")))?;
    if key.len() != algorithm.public_key_size() {
        return Err(CryptoError::InvalidEncoding(format!(
            "{algorithm} public key must be {} bytes, got {}",
            algorithm.public_key_size(),
            key.len()
        )));
    }
    Ok((algorithm, key))
}

/// Extract the scalar from an RFC 8410 PKCS#8 v1 X25519 private key.
fn parse_pkcs8(der: &[u8]) -> Result<&[u8]> {
    let [
        0x30,
        outer_len,
        0x02,
        0x01,
        0x00,
        0x30,
        0x05,
        0x06,
        0x03,
        0x2b,
        0x65,
        arc,
        0x04,
        octets_len,
        0x04,
        key_len,
        key @ ..,
    ] = der
    else {
        return Err(CryptoError::InvalidEncoding(
            "not an RFC 8410 PKCS#8 private key".into(),
        ));
    };
    if *arc != KeyAlgorithm::X25519.oid_arc() {
        let name = KeyAlgorithm::from_oid_arc(*arc)
            .map_or_else(|| format!("OID 1.3.101.{arc}"), |alg| alg.to_string());
        return Err(CryptoError::UnsupportedAlgorithm(name));
    }
    if usize::from(*outer_len) != der.len() - 2
        || usize::from(*octets_len) != key.len() + 2
        || usize::from(*key_len) != key.len()
    {
        return Err(CryptoError::InvalidEncoding(
            "PKCS#8 length mismatch".into(),
        ));
    }
    Ok(key)
}
