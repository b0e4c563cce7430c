//! AES-256-CBC + HMAC-SHA256 encrypt-then-MAC
//!
//! Record layout:
//! ```text
//! iv         = 16 random bytes (fresh per call)
//! ciphertext = AES-256-CBC(cipher_key, iv, PKCS#7(plaintext))
//! mac        = HMAC-SHA256(mac_key, iv || ciphertext)
//! ```
//!
//! Decryption verifies the MAC in constant time before the ciphertext is
//! touched, so padding errors can never be observed by an attacker.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::SecretKeyPair;
use crate::{IV_SIZE, MAC_SIZE};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// One encrypted value: IV, MAC and ciphertext.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherRecord {
    pub iv: [u8; IV_SIZE],
    pub mac: [u8; MAC_SIZE],
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for CipherRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherRecord")
            .field("iv", &self.iv)
            .field("mac", &self.mac)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

/// Encrypt `plaintext` under `keys` with a fresh random IV.
pub fn encrypt(plaintext: &[u8], keys: &SecretKeyPair) -> CryptoResult<CipherRecord> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(keys.cipher_key().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mac = compute_mac(keys, &iv, &ciphertext)?;

    Ok(CipherRecord {
        iv,
        mac,
        ciphertext,
    })
}

/// Verify and decrypt a record.
///
/// Any MAC mismatch (tampering or wrong keys) fails with
/// [`CryptoError::Integrity`] and nothing is decrypted.
pub fn decrypt(record: &CipherRecord, keys: &SecretKeyPair) -> CryptoResult<Vec<u8>> {
    let mut mac = new_mac(keys)?;
    mac.update(&record.iv);
    mac.update(&record.ciphertext);
    mac.verify_slice(&record.mac)
        .map_err(|_| CryptoError::Integrity)?;

    // Only reachable with a valid MAC, i.e. with the MAC key in hand.
    Aes256CbcDec::new(keys.cipher_key().into(), (&record.iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&record.ciphertext)
        .map_err(|_| CryptoError::Integrity)
}

/// Encrypt a UTF-8 string.
pub fn encrypt_str(plaintext: &str, keys: &SecretKeyPair) -> CryptoResult<CipherRecord> {
    encrypt(plaintext.as_bytes(), keys)
}

/// Decrypt a record holding a UTF-8 string.
pub fn decrypt_str(record: &CipherRecord, keys: &SecretKeyPair) -> CryptoResult<String> {
    let plaintext = decrypt(record, keys)?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Format("decrypted value is not UTF-8".into()))
}

fn new_mac(keys: &SecretKeyPair) -> CryptoResult<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(keys.mac_key())
        .map_err(|e| CryptoError::Cipher(format!("HMAC init failed: {e}")))
}

fn compute_mac(
    keys: &SecretKeyPair,
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
) -> CryptoResult<[u8; MAC_SIZE]> {
    let mut mac = new_mac(keys)?;
    mac.update(iv);
    mac.update(ciphertext);
    let mut tag = [0u8; MAC_SIZE];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}
