//! RFC 7748 test vectors driven through the public key API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use xdh_crypto::{
    Encoding, KeySerializationEncryption, PrivateFormat, PublicFormat, X25519PrivateKey,
    X25519PublicKey,
};

fn hex32(s: &str) -> [u8; 32] {
    hex::decode(s).unwrap().try_into().unwrap()
}

fn scalar_mult(scalar: &[u8; 32], u: &[u8; 32]) -> [u8; 32] {
    let private = X25519PrivateKey::from_private_bytes(scalar).unwrap();
    let public = X25519PublicKey::from_public_bytes(u).unwrap();
    *private.exchange(&public).unwrap().as_bytes()
}

#[test]
fn section_5_2_vector_1() {
    let out = scalar_mult(
        &hex32("a546e36bf0527c9d3b16154b82465edd62144c0ac1fc5a18506a2244ba449ac4"),
        &hex32("e6db6867583030db3594c1a424b15f7c726624ec26b3353b10a903a6d0ab1c4c"),
    );
    assert_eq!(
        hex::encode(out),
        "c3da55379de9c6908e94ea4df28d084f32eccf03491c71f754b4075577a28552"
    );
}

#[test]
fn section_5_2_vector_2() {
    let out = scalar_mult(
        &hex32("4b66e9d4d1b4673c5ad22691957d6af5c11b6421e0ea01d42ca4169e7918ba0d"),
        &hex32("e5210f12786811d3f4b7959d0538ae2c31dbe7106fc03c3efc4cd549c715a493"),
    );
    assert_eq!(
        hex::encode(out),
        "95cbde9476e8907d7aade45cb4b873f88b595a68799fa152e6f8f7647aac7957"
    );
}

#[test]
fn section_5_2_iterated() {
    let mut k = [0u8; 32];
    k[0] = 9;
    let mut u = k;

    for i in 1..=1000 {
        let next = scalar_mult(&k, &u);
        u = k;
        k = next;
        if i == 1 {
            assert_eq!(
                hex::encode(k),
                "422c8e7a6227d7bca1350b3e2bb7279f7897b87bb6854b783c60e80311ae3079"
            );
        }
    }
    assert_eq!(
        hex::encode(k),
        "684cf59ba83309552800ef566f2f4d3c1c3887c49360e3875f2eb94d99532c51"
    );
}

#[test]
fn section_6_1_diffie_hellman() {
    let alice_private =
        hex32("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a");
    let bob_private = hex32("5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb");

    let alice = X25519PrivateKey::from_private_bytes(&alice_private).unwrap();
    let bob = X25519PrivateKey::from_private_bytes(&bob_private).unwrap();

    assert_eq!(
        hex::encode(
            alice
                .public_key()
                .public_bytes(Encoding::Raw, PublicFormat::Raw)
                .unwrap()
        ),
        "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a"
    );
    assert_eq!(
        hex::encode(
            bob.public_key()
                .public_bytes(Encoding::Raw, PublicFormat::Raw)
                .unwrap()
        ),
        "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f"
    );

    let shared_ab = alice.exchange(&bob.public_key()).unwrap();
    let shared_ba = bob.exchange(&alice.public_key()).unwrap();
    assert_eq!(shared_ab, shared_ba);
    assert_eq!(
        hex::encode(shared_ab.as_bytes()),
        "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742"
    );

    // Raw export hands back exactly the scalar that went in.
    let exported = alice
        .private_bytes(
            Encoding::Raw,
            PrivateFormat::Raw,
            &KeySerializationEncryption::NoEncryption,
        )
        .unwrap();
    assert_eq!(exported.as_slice(), &alice_private);
}
