// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Role catalogue repository.
//!
//! Roles and permissions are read-only from the point of view of user
//! management; the write methods here exist for seeding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nucleus_server_auth::{Permission, PermissionId, Role, RoleId};
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait RoleCatalogue: Send + Sync {
	/// Every role with its permissions, ordered by name.
	async fn list_all_roles(&self) -> Result<Vec<Role>, DbError>;
	/// The role new users are enrolled into.
	async fn get_member_role(&self) -> Result<Role, DbError>;
	/// The subset of `ids` that name existing roles.
	async fn find_roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>, DbError>;
}

#[async_trait]
impl RoleCatalogue for RoleRepository {
	async fn list_all_roles(&self) -> Result<Vec<Role>, DbError> {
		self.list_all_roles().await
	}

	async fn get_member_role(&self) -> Result<Role, DbError> {
		self.get_member_role().await
	}

	async fn find_roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>, DbError> {
		self.find_roles_by_ids(ids).await
	}
}

/// Repository for roles and permissions.
#[derive(Clone)]
pub struct RoleRepository {
	pool: SqlitePool,
	member_role_name: String,
}

impl RoleRepository {
	/// Create a new repository.
	///
	/// # Arguments
	/// * `pool` - SQLite connection pool
	/// * `member_role_name` - Name of the role new users are enrolled into
	pub fn new(pool: SqlitePool, member_role_name: impl Into<String>) -> Self {
		Self {
			pool,
			member_role_name: member_role_name.into(),
		}
	}

	pub fn member_role_name(&self) -> &str {
		&self.member_role_name
	}

	/// List every role with its permissions, ordered by name.
	#[tracing::instrument(skip(self))]
	pub async fn list_all_roles(&self) -> Result<Vec<Role>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, name, created_at
			FROM roles
			ORDER BY name COLLATE NOCASE ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		let mut roles = rows
			.iter()
			.map(row_to_role)
			.collect::<Result<Vec<_>, _>>()?;

		let perm_rows = sqlx::query(
			r#"
			SELECT rp.role_id, p.id, p.name, p.display_name
			FROM role_permissions rp
			INNER JOIN permissions p ON p.id = rp.permission_id
			ORDER BY p.name ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;
		attach_permissions(&mut roles, &perm_rows)?;

		tracing::debug!(count = roles.len(), "listed roles");
		Ok(roles)
	}

	/// Get the configured member role.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if no role carries the configured name.
	#[tracing::instrument(skip(self), fields(member_role = %self.member_role_name))]
	pub async fn get_member_role(&self) -> Result<Role, DbError> {
		self
			.find_role_by_name(&self.member_role_name)
			.await?
			.ok_or_else(|| {
				DbError::NotFound(format!("member role '{}' does not exist", self.member_role_name))
			})
	}

	/// Find a role by name (case-insensitive), with its permissions.
	#[tracing::instrument(skip(self))]
	pub async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, created_at
			FROM roles
			WHERE name = ? COLLATE NOCASE
			"#,
		)
		.bind(name)
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};
		let mut roles = vec![row_to_role(&row)?];

		let perm_rows = sqlx::query(
			r#"
			SELECT rp.role_id, p.id, p.name, p.display_name
			FROM role_permissions rp
			INNER JOIN permissions p ON p.id = rp.permission_id
			WHERE rp.role_id = ?
			ORDER BY p.name ASC
			"#,
		)
		.bind(roles[0].id.to_string())
		.fetch_all(&self.pool)
		.await?;
		attach_permissions(&mut roles, &perm_rows)?;

		Ok(roles.pop())
	}

	/// Find the roles named by `ids`. Unknown ids are skipped; permissions are
	/// not loaded.
	#[tracing::instrument(skip(self, ids), fields(requested = ids.len()))]
	pub async fn find_roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>, DbError> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let placeholders = vec!["?"; ids.len()].join(", ");
		let sql = format!(
			"SELECT id, name, created_at FROM roles WHERE id IN ({placeholders}) ORDER BY name ASC"
		);
		let mut query = sqlx::query(&sql);
		for id in ids {
			query = query.bind(id.to_string());
		}
		let rows = query.fetch_all(&self.pool).await?;

		rows.iter().map(row_to_role).collect()
	}

	/// Insert a role.
	///
	/// # Database Constraints
	/// - `name` must be unique (case-insensitive)
	#[tracing::instrument(skip(self, role), fields(role_id = %role.id, name = %role.name))]
	pub async fn create_role(&self, role: &Role) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO roles (id, name, created_at)
			VALUES (?, ?, ?)
			"#,
		)
		.bind(role.id.to_string())
		.bind(&role.name)
		.bind(role.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(role_id = %role.id, "role created");
		Ok(())
	}

	/// Insert a permission.
	#[tracing::instrument(skip(self, permission), fields(permission = %permission.name))]
	pub async fn create_permission(&self, permission: &Permission) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO permissions (id, name, display_name)
			VALUES (?, ?, ?)
			"#,
		)
		.bind(permission.id.to_string())
		.bind(&permission.name)
		.bind(&permission.display_name)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// Find a permission by its machine name.
	#[tracing::instrument(skip(self))]
	pub async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, display_name
			FROM permissions
			WHERE name = ?
			"#,
		)
		.bind(name)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_permission(&r)).transpose()
	}

	/// Link a permission to a role. Linking twice is a no-op.
	#[tracing::instrument(skip(self), fields(role_id = %role_id, permission_id = %permission_id))]
	pub async fn grant_permission(
		&self,
		role_id: &RoleId,
		permission_id: &PermissionId,
	) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT OR IGNORE INTO role_permissions (role_id, permission_id)
			VALUES (?, ?)
			"#,
		)
		.bind(role_id.to_string())
		.bind(permission_id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(())
	}
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid timestamp '{value}': {e}")))
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, DbError> {
	Uuid::parse_str(value).map_err(|e| DbError::Internal(format!("Invalid UUID '{value}': {e}")))
}

/// Map a row with `id`, `name` and `created_at` columns.
pub(crate) fn row_to_role(row: &sqlx::sqlite::SqliteRow) -> Result<Role, DbError> {
	let id: String = row.get("id");
	let created_at: String = row.get("created_at");

	Ok(Role {
		id: RoleId::new(parse_uuid(&id)?),
		name: row.get("name"),
		permissions: Vec::new(),
		created_at: parse_timestamp(&created_at)?,
	})
}

fn row_to_permission(row: &sqlx::sqlite::SqliteRow) -> Result<Permission, DbError> {
	let id: String = row.get("id");

	Ok(Permission {
		id: PermissionId::new(parse_uuid(&id)?),
		name: row.get("name"),
		display_name: row.get("display_name"),
	})
}

/// Distribute `(role_id, id, name, display_name)` rows onto their roles.
pub(crate) fn attach_permissions(
	roles: &mut [Role],
	rows: &[sqlx::sqlite::SqliteRow],
) -> Result<(), DbError> {
	let mut by_role: HashMap<RoleId, Vec<Permission>> = HashMap::new();
	for row in rows {
		let role_id: String = row.get("role_id");
		by_role
			.entry(RoleId::new(parse_uuid(&role_id)?))
			.or_default()
			.push(row_to_permission(row)?);
	}

	for role in roles.iter_mut() {
		if let Some(permissions) = by_role.remove(&role.id) {
			role.permissions = permissions;
		}
	}
	Ok(())
}
