// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Password policy and hashing.

use argon2::password_hash::{
	rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use serde::{Deserialize, Serialize};

use crate::argon2_config::argon2_instance;
use crate::identity::{IdentityError, IdentityErrorCode, IdentityFailure};

pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
	#[error("failed to hash password")]
	Hash,
	#[error("invalid password hash format")]
	InvalidHash,
}

/// Rules a new password must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
	pub min_length: usize,
	pub require_digit: bool,
	pub require_lowercase: bool,
	pub require_uppercase: bool,
	pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
	fn default() -> Self {
		Self {
			min_length: DEFAULT_MIN_PASSWORD_LENGTH,
			require_digit: true,
			require_lowercase: true,
			require_uppercase: true,
			require_non_alphanumeric: true,
		}
	}
}

impl PasswordPolicy {
	/// Check a candidate password, reporting every rule it breaks.
	pub fn validate(&self, password: &str) -> Result<(), IdentityFailure> {
		let mut errors = Vec::new();

		if password.chars().count() < self.min_length {
			errors.push(IdentityError::new(
				IdentityErrorCode::PasswordTooShort,
				format!("Passwords must be at least {} characters.", self.min_length),
			));
		}
		if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
			errors.push(IdentityError::new(
				IdentityErrorCode::PasswordRequiresDigit,
				"Passwords must have at least one digit ('0'-'9').",
			));
		}
		if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
			errors.push(IdentityError::new(
				IdentityErrorCode::PasswordRequiresLower,
				"Passwords must have at least one lowercase letter.",
			));
		}
		if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
			errors.push(IdentityError::new(
				IdentityErrorCode::PasswordRequiresUpper,
				"Passwords must have at least one uppercase letter.",
			));
		}
		if self.require_non_alphanumeric && password.chars().all(|c| c.is_alphanumeric()) {
			errors.push(IdentityError::new(
				IdentityErrorCode::PasswordRequiresNonAlphanumeric,
				"Passwords must have at least one non alphanumeric character.",
			));
		}

		match IdentityFailure::from_errors(errors) {
			Some(failure) => Err(failure),
			None => Ok(()),
		}
	}
}

/// Hashes a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
	let salt = SaltString::generate(&mut OsRng);

	argon2_instance()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|_| PasswordError::Hash)
}

/// Verifies a password against a stored PHC hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
	let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

	Ok(
		argon2_instance()
			.verify_password(password.as_bytes(), &parsed_hash)
			.is_ok(),
	)
}
