// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role catalogue entities.
//!
//! - [`Role`] - named bundle of permissions, shared by many users
//! - [`Permission`] - leaf capability owned by roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PermissionId, RoleId};

/// A named permission bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	/// Unique identifier for this role.
	pub id: RoleId,

	/// Unique role name (e.g. "Admin", "Member").
	pub name: String,

	/// Permissions carried by this role. Empty unless the role was loaded
	/// with its permissions.
	pub permissions: Vec<Permission>,

	/// When the role was created.
	pub created_at: DateTime<Utc>,
}

impl Role {
	/// Creates a role with a fresh id and no permissions.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: RoleId::generate(),
			name: name.into(),
			permissions: Vec::new(),
			created_at: Utc::now(),
		}
	}

	pub fn has_permission(&self, name: &str) -> bool {
		self.permissions.iter().any(|p| p.name == name)
	}
}

/// A leaf capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
	pub id: PermissionId,

	/// Dotted machine name (e.g. "permissions.users.create").
	pub name: String,

	pub display_name: String,
}

impl Permission {
	pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
		Self {
			id: PermissionId::generate(),
			name: name.into(),
			display_name: display_name.into(),
		}
	}
}
