// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and response shapes for user management.

use nucleus_server_auth::{Permission, Role, RoleId, User, UserId};
use serde::{Deserialize, Serialize};

/// Query parameters for listing users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserListInput {
	/// Case-insensitive substring matched against user name or email.
	pub filter: Option<String>,
	pub sort_by: Option<String>,
	/// Zero-based page number.
	pub page_index: u32,
	/// Zero falls back to the configured default.
	pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
	pub items: Vec<T>,
	/// Count of all matching users, not just this page.
	pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
	pub id: UserId,
	pub user_name: String,
	pub email: String,
}

impl From<&User> for UserListItem {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			user_name: user.user_name.clone(),
			email: user.email.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDto {
	pub name: String,
	pub display_name: String,
}

impl From<&Permission> for PermissionDto {
	fn from(permission: &Permission) -> Self {
		Self {
			name: permission.name.clone(),
			display_name: permission.display_name.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
	pub id: RoleId,
	pub name: String,
	pub permissions: Vec<PermissionDto>,
}

impl From<&Role> for RoleDto {
	fn from(role: &Role) -> Self {
		Self {
			id: role.id,
			name: role.name.clone(),
			permissions: role.permissions.iter().map(PermissionDto::from).collect(),
		}
	}
}

/// A user with its materialized roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
	pub id: UserId,
	pub user_name: String,
	pub email: String,
	pub roles: Vec<RoleDto>,
}

impl From<&User> for UserDetail {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			user_name: user.user_name.clone(),
			email: user.email.clone(),
			roles: user.granted_roles().map(RoleDto::from).collect(),
		}
	}
}

/// User fields submitted by the create/edit form.
///
/// A nil `id` means "create". `password` is required on create; on edit a
/// missing or empty password leaves the current one in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
	#[serde(default = "UserId::nil")]
	pub id: UserId,
	pub user_name: String,
	pub email: String,
	#[serde(default, skip_serializing)]
	pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrUpdateUserInput {
	pub user: UserInput,
	#[serde(default)]
	pub granted_role_ids: Vec<RoleId>,
}

/// Everything the create/edit form needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserForCreateOrUpdateOutput {
	/// Absent when preparing a new user.
	pub user: Option<UserDetail>,
	/// The full role catalogue, ordered by name.
	pub all_roles: Vec<RoleDto>,
	pub granted_role_ids: Vec<RoleId>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn list_input_defaults_missing_fields() {
		let input: UserListInput = serde_json::from_str(r#"{"filter":"ali"}"#).unwrap();
		assert_eq!(input.filter.as_deref(), Some("ali"));
		assert_eq!(input.sort_by, None);
		assert_eq!(input.page_index, 0);
		assert_eq!(input.page_size, 0);
	}

	#[test]
	fn create_input_without_id_means_new_user() {
		let input: CreateOrUpdateUserInput = serde_json::from_str(
			r#"{"user":{"userName":"bob","email":"b@x.com","password":"Pwd1!"}}"#,
		)
		.unwrap();
		assert!(input.user.id.is_nil());
		assert!(input.granted_role_ids.is_empty());
	}

	#[test]
	fn password_is_never_serialized() {
		let input = UserInput {
			id: UserId::generate(),
			user_name: "bob".to_string(),
			email: "b@x.com".to_string(),
			password: Some("Pwd1!".to_string()),
		};
		let json = serde_json::to_string(&input).unwrap();
		assert!(!json.contains("Pwd1!"));
		assert!(json.contains("userName"));
	}

	#[test]
	fn detail_carries_materialized_roles() {
		let role = Role::new("Admin");
		let mut user = User::new(UserId::nil(), "bob", "b@x.com");
		user.roles.push(nucleus_server_auth::UserRole::with_role(user.id, role.clone()));

		let detail = UserDetail::from(&user);
		assert_eq!(detail.roles.len(), 1);
		assert_eq!(detail.roles[0].name, "Admin");
	}
}
