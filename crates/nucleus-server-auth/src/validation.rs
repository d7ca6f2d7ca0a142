// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User name and email format checks applied by the credential store.

use crate::identity::{IdentityError, IdentityErrorCode};

const USER_NAME_EXTRA_CHARS: &[char] = &['-', '.', '_', '@', '+'];
const MAX_USER_NAME_LEN: usize = 256;

/// Letters, digits and `-._@+`, non-empty.
pub fn validate_user_name(user_name: &str) -> Result<(), IdentityError> {
	let valid = !user_name.is_empty()
		&& user_name.len() <= MAX_USER_NAME_LEN
		&& user_name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || USER_NAME_EXTRA_CHARS.contains(&c));

	if valid {
		Ok(())
	} else {
		Err(IdentityError::new(
			IdentityErrorCode::InvalidUserName,
			format!("User name '{user_name}' is invalid, can only contain letters or digits."),
		))
	}
}

/// Exactly one `@` with a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), IdentityError> {
	let valid = match email.split_once('@') {
		Some((local, domain)) => {
			!local.is_empty()
				&& !domain.contains('@')
				&& domain.contains('.')
				&& !domain.starts_with('.')
				&& !domain.ends_with('.')
				&& !email.chars().any(char::is_whitespace)
		}
		None => false,
	};

	if valid {
		Ok(())
	} else {
		Err(IdentityError::new(
			IdentityErrorCode::InvalidEmail,
			format!("Email '{email}' is invalid."),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_common_user_names() {
		for name in ["alice", "bob.smith", "carol_1", "dave+ops", "erin@corp"] {
			assert!(validate_user_name(name).is_ok(), "{name}");
		}
	}

	#[test]
	fn rejects_bad_user_names() {
		for name in ["", "with space", "semi;colon", "slash/"] {
			assert_eq!(
				validate_user_name(name).unwrap_err().code,
				IdentityErrorCode::InvalidUserName,
				"{name}"
			);
		}
	}

	#[test]
	fn email_checks() {
		assert!(validate_email("a@x.com").is_ok());
		assert!(validate_email("first.last@sub.example.org").is_ok());
		for email in ["", "no-at.com", "a@b", "a@@x.com", "@x.com", "a@.com", "a b@x.com"] {
			assert_eq!(
				validate_email(email).unwrap_err().code,
				IdentityErrorCode::InvalidEmail,
				"{email}"
			);
		}
	}
}
