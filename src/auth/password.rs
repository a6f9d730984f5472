use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};

use crate::error::AppError;

const TEMP_PASSWORD_LEN: usize = 12;
const TEMP_PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// False for a wrong password and for a hash that does not parse.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hashed) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Random alphanumeric password handed to an admin after create/reset.
pub fn generate_temp_password() -> String {
    let mut rng = OsRng;
    (0..TEMP_PASSWORD_LEN)
        .map(|_| {
            let idx = (rng.next_u32() as usize) % TEMP_PASSWORD_ALPHABET.len();
            TEMP_PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}
