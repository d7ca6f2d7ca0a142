// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User aggregate.
//!
//! This module provides:
//! - [`User`] - identity record that exclusively owns its role links
//! - [`UserRole`] - the (user, role) link entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::types::{RoleId, SecurityStamp, UserId};

/// A user account.
///
/// The password hash is owned by the credential store and never travels on
/// this type.
///
/// # PII Handling
///
/// `user_name` and `email` are user-provided PII and should be redacted in logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
	/// Unique identifier for this user.
	pub id: UserId,

	/// User name, unique among active users.
	pub user_name: String,

	pub email: String,

	/// Rotated whenever credentials or identity fields change.
	pub security_stamp: SecurityStamp,

	/// Role links. Only populated when the user was loaded with its roles.
	pub roles: Vec<UserRole>,

	pub created_at: DateTime<Utc>,

	pub updated_at: DateTime<Utc>,

	/// Set once the account has been removed.
	pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
	/// Creates a new user. A nil `id` is replaced with a freshly generated one.
	pub fn new(id: UserId, user_name: impl Into<String>, email: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: if id.is_nil() { UserId::generate() } else { id },
			user_name: user_name.into(),
			email: email.into(),
			security_stamp: SecurityStamp::generate(),
			roles: Vec::new(),
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}

	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}

	/// Invalidates anything bound to the previous stamp.
	pub fn rotate_security_stamp(&mut self) {
		self.security_stamp = SecurityStamp::generate();
	}

	/// Ids of the roles currently linked to this user, in link order.
	pub fn granted_role_ids(&self) -> Vec<RoleId> {
		self.roles.iter().map(|link| link.role_id).collect()
	}

	/// Materialized roles of the current links.
	pub fn granted_roles(&self) -> impl Iterator<Item = &Role> {
		self.roles.iter().filter_map(|link| link.role.as_ref())
	}

	/// Drops every role link held in memory.
	pub fn clear_roles(&mut self) {
		self.roles.clear();
	}
}

/// Link between a user and a role.
///
/// Identified only by the (user, role) pair; `role` is filled in when the
/// link was loaded together with its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
	pub user_id: UserId,
	pub role_id: RoleId,
	pub role: Option<Role>,
}

impl UserRole {
	pub fn new(user_id: UserId, role_id: RoleId) -> Self {
		Self {
			user_id,
			role_id,
			role: None,
		}
	}

	pub fn with_role(user_id: UserId, role: Role) -> Self {
		Self {
			user_id,
			role_id: role.id,
			role: Some(role),
		}
	}
}
