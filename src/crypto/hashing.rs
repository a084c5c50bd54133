// Hashing primitives for identifiers, registration codes and data-hash chains.

use ethers::utils::keccak256;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Default length (in hex characters) of a registration code.
pub const REGISTRATION_CODE_LEN: usize = 24;

/// A helper function to sort a JSON object's keys recursively.
/// This is essential for canonical serialization.
fn sort_json_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted_map: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), sort_json_value(v)))
                .collect();
            Value::Object(sorted_map.into_iter().collect())
        }
        Value::Array(arr) => {
            let sorted_arr = arr.iter().map(sort_json_value).collect();
            Value::Array(sorted_arr)
        }
        _ => value.clone(),
    }
}

/// Renders a value the way it is fed into a hash.
///
/// Strings are taken verbatim (no surrounding quotes); everything else is
/// serialized compactly with object keys sorted.
pub fn canonical_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => sort_json_value(other).to_string(),
    }
}

/// HMAC-SHA-256 of `data` keyed by `key`, lowercase hex.
pub fn hash_data_with_key(data: &Value, key: &str) -> String {
    hmac_hex(canonical_string(data).as_bytes(), key)
}

/// Same as [`hash_data_with_key`] for data that is already a string.
pub fn hash_str_with_key(data: &str, key: &str) -> String {
    hmac_hex(data.as_bytes(), key)
}

fn hmac_hex(data: &[u8], key: &str) -> String {
    // HMAC is defined for keys of any length, so this cannot fail.
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Unkeyed SHA-256 fingerprint, lowercase hex.
pub fn generate_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Generates a random registration code of exactly `length` hex characters.
pub fn generate_registration_code(length: usize) -> String {
    let mut buf = vec![0u8; length.div_ceil(2)];
    OsRng.fill_bytes(&mut buf);
    let mut code = hex::encode(buf);
    code.truncate(length);
    code
}

/// The UID a person is known by on the ledger: their government ID keyed by
/// the institution's secret.
pub fn derive_user_uid(govt_id: &str, institution_secret: &str) -> String {
    hash_str_with_key(govt_id, institution_secret)
}

/// Two-step data hash: profile keyed by the user's random words, then keyed
/// again by the registration code.
pub fn derive_data_hash(profile: &Value, random_words: &str, registration_code: &str) -> String {
    let first = hash_data_with_key(profile, random_words);
    hash_str_with_key(&first, registration_code)
}

/// A one-time session key and the hash handed to the ledger.
#[derive(Clone)]
pub struct SessionKey {
    pub key: String,
    pub key_hash: [u8; 32],
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("key_hash", &format!("0x{}", hex::encode(self.key_hash)))
            .finish_non_exhaustive()
    }
}

/// 32 random bytes as `0x`-prefixed hex; the hash is keccak256 over the
/// UTF-8 bytes of that string.
pub fn generate_session_key() -> SessionKey {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let key = format!("0x{}", hex::encode(bytes));
    let key_hash = keccak256(key.as_bytes());
    SessionKey { key, key_hash }
}
