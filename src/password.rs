//! Password hashing and credential rules.
//!
//! Hashes are PBKDF2-HMAC-SHA256 encoded as
//! `pbkdf2-sha256$<rounds>$<salt hex>$<hash hex>` so the round count can be
//! raised later without invalidating stored hashes.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

pub const PBKDF2_ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const SCHEME: &str = "pbkdf2-sha256";

/// Checked in place of a stored hash when the account does not exist.
const DUMMY_HASH: &str = "pbkdf2-sha256$100000$6869667a2d64756d6d792d73616c7400$\
                          0000000000000000000000000000000000000000000000000000000000000000";

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const USERNAME_CHARS: std::ops::RangeInclusive<usize> = 3..=32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("username must be 3-32 characters of letters, digits, '_', '.' or '-'")]
    InvalidUsername,

    #[error("email address is invalid")]
    InvalidEmail,

    #[error("password must be at least 8 characters")]
    WeakPassword,
}

pub fn validate_username(username: &str) -> Result<(), CredentialError> {
    let ok = USERNAME_CHARS.contains(&username.chars().count())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if ok {
        Ok(())
    } else {
        Err(CredentialError::InvalidUsername)
    }
}

pub fn validate_email(email: &str) -> Result<(), CredentialError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CredentialError::InvalidEmail)
    }
}

pub fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(CredentialError::WeakPassword);
    }
    Ok(())
}

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_with(password, &salt, PBKDF2_ROUNDS)
}

fn hash_with(password: &str, salt: &[u8], rounds: u32) -> String {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    format!(
        "{}${}${}${}",
        SCHEME,
        rounds,
        hex::encode(salt),
        hex::encode(out)
    )
}

/// Split a stored hash into its round count and salt.
fn parse_hash(stored: &str) -> Option<(u32, Vec<u8>)> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(_), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return None;
    };
    if scheme != SCHEME {
        return None;
    }
    let (Ok(rounds), Ok(salt)) = (rounds.parse::<u32>(), hex::decode(salt)) else {
        return None;
    };
    (rounds > 0).then_some((rounds, salt))
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match parse_hash(stored) {
        Some((rounds, salt)) => constant_time_eq(&hash_with(password, &salt, rounds), stored),
        None => false,
    }
}

/// Verify a login attempt. An unknown account (`stored` is `None`) still pays
/// for a full derivation and always fails.
pub fn verify_login(password: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) => verify_password(password, stored),
        None => {
            let _ = verify_password(password, DUMMY_HASH);
            false
        }
    }
}

pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a_bytes.iter().zip(b_bytes) {
        diff |= x ^ y;
    }
    diff == 0
}
