//! Canonical printable form of a [`CipherRecord`]
//!
//! Format v1 (frozen, it is what sits on disk):
//! ```text
//! base64(iv) ":" base64(mac) ":" base64(ciphertext)
//! ```
//! Standard alphabet, padded, no line wrapping. Decoding checks every field
//! length so a damaged value is rejected instead of silently reinterpreted.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::str::FromStr;

use crate::cipher::CipherRecord;
use crate::error::{CryptoError, CryptoResult};
use crate::{BLOCK_SIZE, IV_SIZE, MAC_SIZE};

const SEPARATOR: char = ':';

/// Encode a record as `iv:mac:ciphertext`.
pub fn encode(record: &CipherRecord) -> String {
    format!(
        "{}{SEPARATOR}{}{SEPARATOR}{}",
        STANDARD.encode(record.iv),
        STANDARD.encode(record.mac),
        STANDARD.encode(&record.ciphertext)
    )
}

/// Parse the output of [`encode`].
pub fn decode(encoded: &str) -> CryptoResult<CipherRecord> {
    let parts: Vec<&str> = encoded.split(SEPARATOR).collect();
    if parts.len() != 3 {
        return Err(CryptoError::Format(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    }

    let iv = decode_fixed::<IV_SIZE>(parts[0], "iv")?;
    let mac = decode_fixed::<MAC_SIZE>(parts[1], "mac")?;
    let ciphertext = decode_segment(parts[2], "ciphertext")?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Format(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
            ciphertext.len()
        )));
    }

    Ok(CipherRecord {
        iv,
        mac,
        ciphertext,
    })
}

fn decode_segment(segment: &str, field: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(segment)
        .map_err(|e| CryptoError::Format(format!("{field}: {e}")))
}

fn decode_fixed<const N: usize>(segment: &str, field: &str) -> CryptoResult<[u8; N]> {
    let bytes = decode_segment(segment, field)?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        CryptoError::Format(format!("{field}: expected {N} bytes, found {}", bytes.len()))
    })
}

impl fmt::Display for CipherRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

impl FromStr for CipherRecord {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::encrypt;
    use crate::kdf::SecretKeyPair;
    use crate::KEY_SIZE;

    fn sample_record() -> CipherRecord {
        let keys = SecretKeyPair::from_bytes([0x01u8; KEY_SIZE], [0x02u8; KEY_SIZE]);
        encrypt(b"encoding sample", &keys).unwrap()
    }

    fn assert_format_error(input: &str) {
        assert!(
            matches!(decode(input), Err(CryptoError::Format(_))),
            "expected FormatError for {input:?}"
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let record = sample_record();
        let encoded = encode(&record);
        assert_eq!(decode(&encoded).unwrap(), record);
    }

    #[test]
    fn test_display_and_from_str_agree() {
        let record = sample_record();
        let parsed: CipherRecord = record.to_string().parse().unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_encoded_shape() {
        let encoded = encode(&sample_record());
        let parts: Vec<&str> = encoded.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 24, "16-byte IV is 24 base64 chars");
        assert_eq!(parts[1].len(), 44, "32-byte MAC is 44 base64 chars");
        assert!(encoded.is_ascii());
        assert!(!encoded.contains('\n'));
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        assert_format_error("");
        assert_format_error("abc");
        assert_format_error("a:b");
        let encoded = encode(&sample_record());
        assert_format_error(&format!("{encoded}:extra"));
    }

    #[test]
    fn test_rejects_non_alphabet_characters() {
        let encoded = encode(&sample_record());
        let corrupted = encoded.replacen(|c: char| c.is_ascii_alphanumeric(), "*", 1);
        assert_format_error(&corrupted);
    }

    #[test]
    fn test_rejects_truncation() {
        let encoded = encode(&sample_record());
        assert_format_error(&encoded[..encoded.len() - 1]);
    }

    #[test]
    fn test_rejects_wrong_iv_length() {
        let record = sample_record();
        let encoded = format!(
            "{}:{}:{}",
            STANDARD.encode([0u8; 8]),
            STANDARD.encode(record.mac),
            STANDARD.encode(&record.ciphertext)
        );
        assert_format_error(&encoded);
    }

    #[test]
    fn test_rejects_wrong_mac_length() {
        let record = sample_record();
        let encoded = format!(
            "{}:{}:{}",
            STANDARD.encode(record.iv),
            STANDARD.encode([0u8; 20]),
            STANDARD.encode(&record.ciphertext)
        );
        assert_format_error(&encoded);
    }

    #[test]
    fn test_rejects_partial_block_ciphertext() {
        let record = sample_record();
        let encoded = format!(
            "{}:{}:{}",
            STANDARD.encode(record.iv),
            STANDARD.encode(record.mac),
            STANDARD.encode(&record.ciphertext[..15])
        );
        assert_format_error(&encoded);
    }

    #[test]
    fn test_rejects_empty_ciphertext() {
        let record = sample_record();
        let encoded = format!(
            "{}:{}:",
            STANDARD.encode(record.iv),
            STANDARD.encode(record.mac)
        );
        assert_format_error(&encoded);
    }
}
