// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Internal: {0}")]
	Internal(String),
}

impl DbError {
	/// Returns true if this wraps a UNIQUE constraint violation.
	pub fn is_unique_violation(&self) -> bool {
		match self {
			DbError::Sqlx(e) => is_unique_violation(e),
			_ => false,
		}
	}
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
	e.as_database_error()
		.is_some_and(|db| db.is_unique_violation())
}

pub type Result<T> = std::result::Result<T, DbError>;
