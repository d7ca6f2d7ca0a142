// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller-supplied sort keys for the user listing.
//!
//! Accepted grammar: `<field>[ asc|desc]`, case-insensitive, where field is
//! one of `username`/`user_name`, `email`, `createdat`/`created_at`. A missing
//! or blank key sorts by user name ascending. Anything else is rejected.

use nucleus_server_db::{SortDirection, UserOrder, UserSortField};

use crate::error::UserServiceError;

pub fn parse_sort_key(sort_by: Option<&str>) -> Result<UserOrder, UserServiceError> {
	let Some(raw) = sort_by.map(str::trim).filter(|s| !s.is_empty()) else {
		return Ok(UserOrder::default());
	};

	let invalid = || UserServiceError::InvalidSortKey(raw.to_string());
	let mut parts = raw.split_whitespace();
	let field = parts.next().ok_or_else(invalid)?;
	let direction = parts.next();
	if parts.next().is_some() {
		return Err(invalid());
	}

	let field = match field.to_ascii_lowercase().as_str() {
		"username" | "user_name" => UserSortField::UserName,
		"email" => UserSortField::Email,
		"createdat" | "created_at" => UserSortField::CreatedAt,
		_ => return Err(invalid()),
	};
	let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
		None | Some("asc") => SortDirection::Ascending,
		Some("desc") => SortDirection::Descending,
		Some(_) => return Err(invalid()),
	};

	Ok(UserOrder::new(field, direction))
}
