// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity error taxonomy.
//!
//! Expected business outcomes (a taken user name, a weak password, removing a
//! system account) are reported as an [`IdentityFailure`]: a non-empty list of
//! [`IdentityError`]s, each a stable code plus a human readable description.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityErrorCode {
	/// Another active user already has the requested user name.
	UserNameAlreadyExists,
	/// The target user does not exist (or was removed).
	UserNotFound,
	/// The target account is in the protected-account set.
	CannotRemoveSystemUser,
	/// The credential store refused a duplicate user name.
	DuplicateUserName,
	InvalidUserName,
	InvalidEmail,
	PasswordTooShort,
	PasswordRequiresDigit,
	PasswordRequiresLower,
	PasswordRequiresUpper,
	PasswordRequiresNonAlphanumeric,
	/// A credential was added to an account that already has one.
	UserAlreadyHasPassword,
	/// A granted role id does not name an existing role.
	RoleNotFound,
}

impl IdentityErrorCode {
	pub fn as_str(&self) -> &'static str {
		match self {
			IdentityErrorCode::UserNameAlreadyExists => "UserNameAlreadyExists",
			IdentityErrorCode::UserNotFound => "UserNotFound",
			IdentityErrorCode::CannotRemoveSystemUser => "CannotRemoveSystemUser",
			IdentityErrorCode::DuplicateUserName => "DuplicateUserName",
			IdentityErrorCode::InvalidUserName => "InvalidUserName",
			IdentityErrorCode::InvalidEmail => "InvalidEmail",
			IdentityErrorCode::PasswordTooShort => "PasswordTooShort",
			IdentityErrorCode::PasswordRequiresDigit => "PasswordRequiresDigit",
			IdentityErrorCode::PasswordRequiresLower => "PasswordRequiresLower",
			IdentityErrorCode::PasswordRequiresUpper => "PasswordRequiresUpper",
			IdentityErrorCode::PasswordRequiresNonAlphanumeric => "PasswordRequiresNonAlphanumeric",
			IdentityErrorCode::UserAlreadyHasPassword => "UserAlreadyHasPassword",
			IdentityErrorCode::RoleNotFound => "RoleNotFound",
		}
	}
}

impl fmt::Display for IdentityErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single (code, description) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityError {
	pub code: IdentityErrorCode,
	pub description: String,
}

impl IdentityError {
	pub fn new(code: IdentityErrorCode, description: impl Into<String>) -> Self {
		Self {
			code,
			description: description.into(),
		}
	}

	pub fn user_name_already_exists(user_name: &str) -> Self {
		Self::new(
			IdentityErrorCode::UserNameAlreadyExists,
			format!("User name '{user_name}' is already taken."),
		)
	}

	pub fn user_not_found() -> Self {
		Self::new(IdentityErrorCode::UserNotFound, "User not found.")
	}

	pub fn cannot_remove_system_user(user_name: &str) -> Self {
		Self::new(
			IdentityErrorCode::CannotRemoveSystemUser,
			format!("User '{user_name}' is a system user and cannot be removed."),
		)
	}

	pub fn duplicate_user_name(user_name: &str) -> Self {
		Self::new(
			IdentityErrorCode::DuplicateUserName,
			format!("User name '{user_name}' is already in use."),
		)
	}

	pub fn role_not_found(role_id: impl fmt::Display) -> Self {
		Self::new(
			IdentityErrorCode::RoleNotFound,
			format!("Role '{role_id}' does not exist."),
		)
	}
}

impl fmt::Display for IdentityError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.code, self.description)
	}
}

/// A rejected identity operation with one or more reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IdentityFailureRepr")]
pub struct IdentityFailure {
	errors: Vec<IdentityError>,
}

#[derive(Deserialize)]
struct IdentityFailureRepr {
	errors: Vec<IdentityError>,
}

impl TryFrom<IdentityFailureRepr> for IdentityFailure {
	type Error = &'static str;

	fn try_from(repr: IdentityFailureRepr) -> Result<Self, Self::Error> {
		Self::from_errors(repr.errors).ok_or("identity failure must carry at least one error")
	}
}

impl IdentityFailure {
	/// Build a failure from a list of errors.
	///
	/// Returns `None` when the list is empty, since an empty failure would be a
	/// success in disguise.
	pub fn from_errors(errors: Vec<IdentityError>) -> Option<Self> {
		if errors.is_empty() {
			None
		} else {
			Some(Self { errors })
		}
	}

	pub fn errors(&self) -> &[IdentityError] {
		&self.errors
	}

	/// The first (primary) error code.
	pub fn code(&self) -> IdentityErrorCode {
		self.errors[0].code
	}

	pub fn has_code(&self, code: IdentityErrorCode) -> bool {
		self.errors.iter().any(|e| e.code == code)
	}
}

impl From<IdentityError> for IdentityFailure {
	fn from(error: IdentityError) -> Self {
		Self {
			errors: vec![error],
		}
	}
}

impl fmt::Display for IdentityFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, error) in self.errors.iter().enumerate() {
			if i > 0 {
				f.write_str("; ")?;
			}
			write!(f, "{error}")?;
		}
		Ok(())
	}
}

impl std::error::Error for IdentityFailure {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_error_list_is_not_a_failure() {
		assert!(IdentityFailure::from_errors(Vec::new()).is_none());
	}

	#[test]
	fn primary_code_is_first_error() {
		let failure = IdentityFailure::from_errors(vec![
			IdentityError::new(IdentityErrorCode::PasswordTooShort, "short"),
			IdentityError::new(IdentityErrorCode::PasswordRequiresDigit, "digit"),
		])
		.unwrap();
		assert_eq!(failure.code(), IdentityErrorCode::PasswordTooShort);
		assert!(failure.has_code(IdentityErrorCode::PasswordRequiresDigit));
		assert!(!failure.has_code(IdentityErrorCode::UserNotFound));
	}

	#[test]
	fn display_joins_all_errors() {
		let failure = IdentityFailure::from_errors(vec![
			IdentityError::user_not_found(),
			IdentityError::role_not_found("r1"),
		])
		.unwrap();
		assert_eq!(
			failure.to_string(),
			"UserNotFound: User not found.; RoleNotFound: Role 'r1' does not exist."
		);
	}

	#[test]
	fn deserialize_rejects_empty_error_list() {
		let err = serde_json::from_str::<IdentityFailure>(r#"{"errors":[]}"#).unwrap_err();
		assert!(err.to_string().contains("at least one error"));

		let failure: IdentityFailure = IdentityError::user_not_found().into();
		let json = serde_json::to_string(&failure).unwrap();
		let back: IdentityFailure = serde_json::from_str(&json).unwrap();
		assert_eq!(back.code(), IdentityErrorCode::UserNotFound);
	}

	#[test]
	fn codes_render_as_pascal_case() {
		assert_eq!(
			IdentityErrorCode::CannotRemoveSystemUser.to_string(),
			"CannotRemoveSystemUser"
		);
		assert_eq!(
			IdentityError::user_name_already_exists("alice").code,
			IdentityErrorCode::UserNameAlreadyExists
		);
	}
}
