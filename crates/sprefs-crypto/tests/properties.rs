//! Property tests for the value pipeline: encrypt → encode → decode → decrypt.

use proptest::prelude::*;
use sprefs_crypto::{
    decode, decrypt_str, encode, encrypt_str, obfuscate_key, CryptoError, SecretKeyPair,
};

fn keys() -> SecretKeyPair {
    SecretKeyPair::from_bytes([0x5Au8; 32], [0xA5u8; 32])
}

proptest! {
    #[test]
    fn string_roundtrip(value in any::<String>()) {
        let keys = keys();
        let encoded = encode(&encrypt_str(&value, &keys).unwrap());
        let decoded = decrypt_str(&decode(&encoded).unwrap(), &keys).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn single_byte_flip_never_yields_plaintext(
        value in "[a-zA-Z0-9 ]{0,64}",
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let keys = keys();
        let encoded = encode(&encrypt_str(&value, &keys).unwrap());

        let mut bytes = encoded.into_bytes();
        let idx = position.index(bytes.len());
        bytes[idx] ^= flip;

        // a flipped byte may not even be valid UTF-8
        let Ok(tampered) = String::from_utf8(bytes) else {
            return Ok(());
        };
        let outcome = decode(&tampered).and_then(|record| decrypt_str(&record, &keys));
        prop_assert!(
            matches!(outcome, Err(CryptoError::Format(_)) | Err(CryptoError::Integrity)),
            "tampered value decrypted: {:?}", outcome
        );
    }

    #[test]
    fn obfuscation_is_deterministic(key in any::<String>()) {
        prop_assert_eq!(obfuscate_key(&key), obfuscate_key(&key));
        prop_assert_eq!(obfuscate_key(&key).len(), 44);
    }
}

#[test]
fn long_value_roundtrip() {
    let keys = keys();
    let value = "x".repeat(1 << 20);
    let encoded = encode(&encrypt_str(&value, &keys).unwrap());
    assert_eq!(decrypt_str(&decode(&encoded).unwrap(), &keys).unwrap(), value);
}
