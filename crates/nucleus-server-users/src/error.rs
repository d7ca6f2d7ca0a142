// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use nucleus_server_auth::{IdentityError, IdentityErrorCode, IdentityFailure, PasswordError};
use nucleus_server_db::{CredentialError, DbError};

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
	/// An expected business rejection carrying one or more codes.
	#[error("{0}")]
	Identity(#[from] IdentityFailure),

	#[error("unknown sort key: {0}")]
	InvalidSortKey(String),

	#[error(transparent)]
	Password(#[from] PasswordError),

	#[error(transparent)]
	Database(#[from] DbError),
}

impl UserServiceError {
	pub fn user_not_found() -> Self {
		IdentityError::user_not_found().into()
	}

	/// The primary identity code, if this is a business rejection.
	pub fn code(&self) -> Option<IdentityErrorCode> {
		match self {
			UserServiceError::Identity(failure) => Some(failure.code()),
			_ => None,
		}
	}
}

impl From<IdentityError> for UserServiceError {
	fn from(e: IdentityError) -> Self {
		UserServiceError::Identity(e.into())
	}
}

impl From<CredentialError> for UserServiceError {
	fn from(e: CredentialError) -> Self {
		match e {
			CredentialError::Rejected(failure) => UserServiceError::Identity(failure),
			CredentialError::Password(e) => UserServiceError::Password(e),
			CredentialError::Database(e) => UserServiceError::Database(e),
		}
	}
}

pub type Result<T> = std::result::Result<T, UserServiceError>;
