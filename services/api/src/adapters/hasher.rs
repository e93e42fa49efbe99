//! services/api/src/adapters/hasher.rs
//!
//! This module contains the password hashing adapter. It implements the
//! `PasswordHashingService` port from the `core` crate using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use life_lessons_core::ports::{HashingError, PasswordHashingService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that hashes passwords with Argon2id at a fixed cost.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Creates a new `Argon2Hasher`.
    ///
    /// `cost` is the iteration count. Parameters outside the ranges Argon2
    /// accepts are rejected here, before any password is seen.
    pub fn new(cost: u32, memory_kib: u32) -> Result<Self, HashingError> {
        let params = Params::new(memory_kib, cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| HashingError(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

//=========================================================================================
// `PasswordHashingService` Trait Implementation
//=========================================================================================

impl PasswordHashingService for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashingError(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, HashingError> {
        let parsed_hash = PasswordHash::new(digest).map_err(|e| HashingError(e.to_string()))?;

        // The digest carries its own parameters; verification follows them.
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashingError(e.to_string())),
        }
    }
}
