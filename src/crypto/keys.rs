//! RSA key pairs for doctors, and JSON encryption helpers built on them.
//!
//! Keys are PEM encoded (SPKI public, PKCS#8 private). Payloads are
//! JSON-serialized, encrypted with RSA-OAEP (SHA-256) and base64 encoded.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;

pub const RSA_KEY_BITS: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Error encrypting data: {0}")]
    Encryption(String),

    #[error("Error decrypting data: {0}")]
    Decryption(String),
}

/// PEM-encoded RSA key pair.
#[derive(Clone)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl KeyPair {
    /// Generates a fresh 2048-bit pair. CPU heavy; call from a blocking task.
    pub fn generate() -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);

        let private_key = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?
            .to_string();
        let public_key = public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        Ok(Self {
            public_key,
            private_key,
        })
    }
}

/// Serializes `data` to JSON, encrypts it for `public_key_pem` and returns base64.
pub fn encrypt_data<T: Serialize + ?Sized>(data: &T, public_key_pem: &str) -> Result<String, CryptoError> {
    let public = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
    let plaintext = serde_json::to_vec(data).map_err(|e| CryptoError::Encryption(e.to_string()))?;
    let ciphertext = public
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(BASE64.encode(ciphertext))
}

/// Reverses [`encrypt_data`]. Any malformed input or key mismatch is a
/// [`CryptoError::Decryption`].
pub fn decrypt_data(encrypted: &str, private_key_pem: &str) -> Result<Value, CryptoError> {
    let private = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
    let ciphertext = BASE64
        .decode(encrypted.trim())
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;
    let plaintext = private
        .decrypt(Oaep::new::<Sha256>(), &ciphertext)
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;
    serde_json::from_slice(&plaintext).map_err(|e| CryptoError::Decryption(e.to_string()))
}
