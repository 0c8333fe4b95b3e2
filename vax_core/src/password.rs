//! Password policy and salted credential hashing.
//!
//! Credentials are stored as `(salt, hash)` where the hash is an iterated,
//! salted SHA-256 digest of the password. Verification recomputes the digest
//! with the stored salt and compares in constant time.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Characters that satisfy the "special character" requirement.
pub const SPECIAL_CHARACTERS: [char; 4] = ['!', '@', '#', '?'];

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

const SALT_LEN: usize = 16;
const HASH_ROUNDS: u32 = 10_000;

/// Human-readable statement of the policy, shown when a password is rejected.
pub const PASSWORD_POLICY: &str = "Password is not strong enough. Use at least 8 characters \
with a mixture of upper and lowercase letters, a number, and a special character (!, @, #, ?)";

/// Check the password strength policy.
///
/// Requires at least [`MIN_PASSWORD_LEN`] characters including a lowercase
/// letter, an uppercase letter, a digit and one of [`SPECIAL_CHARACTERS`].
pub fn is_strong_password(password: &str) -> bool {
    let mut has_lower = false;
    let mut has_upper = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        has_lower |= c.is_lowercase();
        has_upper |= c.is_uppercase();
        has_digit |= c.is_ascii_digit();
        has_special |= SPECIAL_CHARACTERS.contains(&c);
    }

    password.chars().count() >= MIN_PASSWORD_LEN && has_lower && has_upper && has_digit && has_special
}

/// Stored credential material for one account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("salt_len", &self.salt.len())
            .field("hash_len", &self.hash.len())
            .finish()
    }
}

impl Credentials {
    /// Derive credentials for a new account using a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let hash = hash_password(password, &salt).to_vec();
        Self { salt, hash }
    }

    /// Check `password` against the stored salt and hash.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = hash_password(password, &self.salt);
        candidate.as_slice().ct_eq(self.hash.as_slice()).into()
    }
}

fn hash_password(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize()
        .into();

    for _ in 1..HASH_ROUNDS {
        digest = Sha256::new()
            .chain_update(salt)
            .chain_update(digest)
            .finalize()
            .into();
    }
    digest
}
