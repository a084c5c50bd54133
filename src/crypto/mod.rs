pub mod hashing;
pub mod keys;

pub use hashing::{
    derive_data_hash, derive_user_uid, generate_hash, generate_registration_code,
    generate_session_key, hash_data_with_key, hash_str_with_key, SessionKey,
    REGISTRATION_CODE_LEN,
};
pub use keys::{decrypt_data, encrypt_data, CryptoError, KeyPair};
