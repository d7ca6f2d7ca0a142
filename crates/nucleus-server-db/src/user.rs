// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User repository for database operations.
//!
//! This module provides:
//! - Lookups that materialize the full role graph (user → links → role → permissions)
//! - Filtered, ordered, paginated listing with an unpaginated total
//! - Replace-all synchronization of a user's role links
//!
//! Removed users (`deleted_at` set) are invisible to every query here.

use async_trait::async_trait;
use nucleus_server_auth::{Role, RoleId, SecurityStamp, User, UserId, UserRole};
use sqlx::{sqlite::SqlitePool, Row, SqliteConnection};
use std::collections::HashSet;

use crate::error::DbError;
use crate::role::{attach_permissions, parse_timestamp, parse_uuid, row_to_role};

/// Columns the user listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortField {
	#[default]
	UserName,
	Email,
	CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
	#[default]
	Ascending,
	Descending,
}

/// Listing order. Only ever rendered from the fixed set of fields above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserOrder {
	pub field: UserSortField,
	pub direction: SortDirection,
}

impl UserOrder {
	pub fn new(field: UserSortField, direction: SortDirection) -> Self {
		Self { field, direction }
	}

	fn order_by_clause(&self) -> &'static str {
		match (self.field, self.direction) {
			(UserSortField::UserName, SortDirection::Ascending) => "user_name COLLATE NOCASE ASC, id ASC",
			(UserSortField::UserName, SortDirection::Descending) => {
				"user_name COLLATE NOCASE DESC, id ASC"
			}
			(UserSortField::Email, SortDirection::Ascending) => "email COLLATE NOCASE ASC, id ASC",
			(UserSortField::Email, SortDirection::Descending) => "email COLLATE NOCASE DESC, id ASC",
			(UserSortField::CreatedAt, SortDirection::Ascending) => "created_at ASC, id ASC",
			(UserSortField::CreatedAt, SortDirection::Descending) => "created_at DESC, id ASC",
		}
	}
}

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn find_by_id_with_roles(&self, id: &UserId) -> Result<Option<User>, DbError>;
	async fn find_by_email_with_roles(&self, email: &str) -> Result<Option<User>, DbError>;
	async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, DbError>;
	async fn list_users(
		&self,
		filter: Option<&str>,
		order: UserOrder,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<User>, i64), DbError>;
	async fn replace_user_roles(&self, user_id: &UserId, role_ids: &[RoleId]) -> Result<(), DbError>;
}

#[async_trait]
impl UserStore for UserRepository {
	async fn find_by_id_with_roles(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.find_by_id_with_roles(id).await
	}

	async fn find_by_email_with_roles(&self, email: &str) -> Result<Option<User>, DbError> {
		self.find_by_email_with_roles(email).await
	}

	async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, DbError> {
		self.find_by_user_name(user_name).await
	}

	async fn list_users(
		&self,
		filter: Option<&str>,
		order: UserOrder,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<User>, i64), DbError> {
		self.list_users(filter, order, offset, limit).await
	}

	async fn replace_user_roles(&self, user_id: &UserId, role_ids: &[RoleId]) -> Result<(), DbError> {
		self.replace_user_roles(user_id, role_ids).await
	}
}

/// How [`UserRepository::find_with_roles`] selects its user.
#[derive(Debug, Clone, Copy)]
enum UserLookup<'a> {
	Id(&'a UserId),
	Email(&'a str),
}

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	/// Create a new repository with the given pool.
	///
	/// # Arguments
	/// * `pool` - SQLite connection pool
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Get an active user by ID with roles and their permissions.
	///
	/// # Returns
	/// `None` if no active user has this ID.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn find_by_id_with_roles(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.find_with_roles(UserLookup::Id(id)).await
	}

	/// Get the oldest active user with this email (case-insensitive), with
	/// roles and their permissions.
	#[tracing::instrument(skip(self, email))]
	pub async fn find_by_email_with_roles(&self, email: &str) -> Result<Option<User>, DbError> {
		self.find_with_roles(UserLookup::Email(email)).await
	}

	/// Get an active user by user name (case-insensitive). Roles are not loaded.
	#[tracing::instrument(skip(self, user_name))]
	pub async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, user_name, email, security_stamp, created_at, updated_at, deleted_at
			FROM users
			WHERE user_name = ? COLLATE NOCASE AND deleted_at IS NULL
			"#,
		)
		.bind(user_name)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	/// The single eager query for a user and its full role graph.
	async fn find_with_roles(&self, lookup: UserLookup<'_>) -> Result<Option<User>, DbError> {
		let query = match lookup {
			UserLookup::Id(id) => sqlx::query(
				r#"
				SELECT id, user_name, email, security_stamp, created_at, updated_at, deleted_at
				FROM users
				WHERE id = ? AND deleted_at IS NULL
				"#,
			)
			.bind(id.to_string()),
			UserLookup::Email(email) => sqlx::query(
				r#"
				SELECT id, user_name, email, security_stamp, created_at, updated_at, deleted_at
				FROM users
				WHERE email = ? COLLATE NOCASE AND deleted_at IS NULL
				ORDER BY created_at ASC, id ASC
				LIMIT 1
				"#,
			)
			.bind(email.to_string()),
		};

		let Some(row) = query.fetch_optional(&self.pool).await? else {
			return Ok(None);
		};
		let mut user = row_to_user(&row)?;
		let user_id = user.id.to_string();

		let role_rows = sqlx::query(
			r#"
			SELECT r.id, r.name, r.created_at
			FROM user_roles ur
			INNER JOIN roles r ON r.id = ur.role_id
			WHERE ur.user_id = ?
			ORDER BY r.name COLLATE NOCASE ASC
			"#,
		)
		.bind(&user_id)
		.fetch_all(&self.pool)
		.await?;
		let mut roles: Vec<Role> = role_rows
			.iter()
			.map(row_to_role)
			.collect::<Result<_, _>>()?;

		let perm_rows = sqlx::query(
			r#"
			SELECT rp.role_id, p.id, p.name, p.display_name
			FROM user_roles ur
			INNER JOIN role_permissions rp ON rp.role_id = ur.role_id
			INNER JOIN permissions p ON p.id = rp.permission_id
			WHERE ur.user_id = ?
			ORDER BY p.name ASC
			"#,
		)
		.bind(&user_id)
		.fetch_all(&self.pool)
		.await?;
		attach_permissions(&mut roles, &perm_rows)?;

		user.roles = roles
			.into_iter()
			.map(|role| UserRole::with_role(user.id, role))
			.collect();

		tracing::debug!(user_id = %user.id, roles = user.roles.len(), "loaded user with roles");
		Ok(Some(user))
	}

	/// List active users.
	///
	/// # Arguments
	/// * `filter` - Case-insensitive substring matched against user name or email;
	///   `None` or blank matches everyone
	/// * `order` - Sort order; ties are broken by id
	/// * `offset` - Number of users to skip
	/// * `limit` - Maximum number of users to return
	///
	/// # Returns
	/// The page of users and the total number of matching users before pagination.
	#[tracing::instrument(skip(self, filter))]
	pub async fn list_users(
		&self,
		filter: Option<&str>,
		order: UserOrder,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<User>, i64), DbError> {
		let needle = filter
			.map(str::trim)
			.filter(|f| !f.is_empty())
			.map(str::to_ascii_lowercase);

		let count_row = sqlx::query(
			r#"
			SELECT COUNT(*) as count
			FROM users
			WHERE deleted_at IS NULL
				AND (? IS NULL OR instr(lower(user_name), ?) > 0 OR instr(lower(email), ?) > 0)
			"#,
		)
		.bind(&needle)
		.bind(&needle)
		.bind(&needle)
		.fetch_one(&self.pool)
		.await?;
		let total: i64 = count_row.get("count");

		let sql = format!(
			r#"
			SELECT id, user_name, email, security_stamp, created_at, updated_at, deleted_at
			FROM users
			WHERE deleted_at IS NULL
				AND (? IS NULL OR instr(lower(user_name), ?) > 0 OR instr(lower(email), ?) > 0)
			ORDER BY {}
			LIMIT ? OFFSET ?
			"#,
			order.order_by_clause()
		);
		let rows = sqlx::query(&sql)
			.bind(&needle)
			.bind(&needle)
			.bind(&needle)
			.bind(limit)
			.bind(offset)
			.fetch_all(&self.pool)
			.await?;

		let users = rows
			.iter()
			.map(row_to_user)
			.collect::<Result<Vec<_>, _>>()?;

		tracing::debug!(total, count = users.len(), "listed users");
		Ok((users, total))
	}

	/// Replace every role link of a user with exactly `role_ids`.
	///
	/// Existing links are deleted and one link per distinct id is inserted, in
	/// a single transaction.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if the user does not exist or was removed.
	///
	/// # Database Constraints
	/// - every id must reference an existing role
	#[tracing::instrument(skip(self, role_ids), fields(user_id = %user_id, roles = role_ids.len()))]
	pub async fn replace_user_roles(
		&self,
		user_id: &UserId,
		role_ids: &[RoleId],
	) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		let active = sqlx::query("SELECT id FROM users WHERE id = ? AND deleted_at IS NULL")
			.bind(user_id.to_string())
			.fetch_optional(&mut *tx)
			.await?;
		if active.is_none() {
			return Err(DbError::NotFound(format!("user {user_id}")));
		}

		let granted = write_role_links(&mut tx, user_id, role_ids).await?;
		tx.commit().await?;

		tracing::debug!(user_id = %user_id, granted, "user roles replaced");
		Ok(())
	}
}

/// Delete every link of `user_id`, then insert one per distinct role id.
///
/// Runs on the caller's connection so it joins the caller's transaction.
pub(crate) async fn write_role_links(
	conn: &mut SqliteConnection,
	user_id: &UserId,
	role_ids: &[RoleId],
) -> Result<usize, sqlx::Error> {
	let user_id = user_id.to_string();

	sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
		.bind(&user_id)
		.execute(&mut *conn)
		.await?;

	let mut seen = HashSet::new();
	for role_id in role_ids.iter().filter(|id| seen.insert(**id)) {
		sqlx::query(
			r#"
			INSERT INTO user_roles (user_id, role_id)
			VALUES (?, ?)
			"#,
		)
		.bind(&user_id)
		.bind(role_id.to_string())
		.execute(&mut *conn)
		.await?;
	}

	Ok(seen.len())
}

pub(crate) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let id: String = row.get("id");
	let security_stamp: String = row.get("security_stamp");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	let deleted_at: Option<String> = row.get("deleted_at");

	Ok(User {
		id: UserId::new(parse_uuid(&id)?),
		user_name: row.get("user_name"),
		email: row.get("email"),
		security_stamp: SecurityStamp::from_stored(security_stamp),
		roles: Vec::new(),
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
		deleted_at: deleted_at.as_deref().map(parse_timestamp).transpose()?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::role::RoleRepository;
	use crate::testing::create_test_pool;
	use chrono::{Duration, Utc};

	async fn insert_user(pool: &SqlitePool, user_name: &str, email: &str) -> User {
		let user = User::new(UserId::nil(), user_name, email);
		insert_user_at(pool, &user, user.created_at).await;
		user
	}

	async fn insert_user_at(pool: &SqlitePool, user: &User, created_at: chrono::DateTime<Utc>) {
		sqlx::query(
			r#"
			INSERT INTO users (id, user_name, email, security_stamp, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.user_name)
		.bind(&user.email)
		.bind(user.security_stamp.as_str())
		.bind(created_at.to_rfc3339())
		.bind(created_at.to_rfc3339())
		.execute(pool)
		.await
		.unwrap();
	}

	async fn insert_role(pool: &SqlitePool, name: &str) -> Role {
		let role = Role::new(name);
		RoleRepository::new(pool.clone(), "Member")
			.create_role(&role)
			.await
			.unwrap();
		role
	}

	#[tokio::test]
	async fn test_find_by_id_with_roles_materializes_graph() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool.clone());
		let roles = RoleRepository::new(pool.clone(), "Member");

		let user = insert_user(&pool, "alice", "a@x.com").await;
		let admin = insert_role(&pool, "Admin").await;
		let read = nucleus_server_auth::Permission::new("permissions.users.read", "Read users");
		roles.create_permission(&read).await.unwrap();
		roles.grant_permission(&admin.id, &read.id).await.unwrap();

		repo.replace_user_roles(&user.id, &[admin.id]).await.unwrap();

		let loaded = repo.find_by_id_with_roles(&user.id).await.unwrap().unwrap();
		assert_eq!(loaded.user_name, "alice");
		assert_eq!(loaded.granted_role_ids(), vec![admin.id]);
		let role = loaded.granted_roles().next().unwrap();
		assert_eq!(role.name, "Admin");
		assert!(role.has_permission("permissions.users.read"));
	}

	#[tokio::test]
	async fn test_find_by_id_missing_returns_none() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool);
		assert!(repo
			.find_by_id_with_roles(&UserId::generate())
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_find_by_email_picks_oldest_active() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool.clone());

		let older = User::new(UserId::nil(), "older", "shared@x.com");
		let newer = User::new(UserId::nil(), "newer", "shared@x.com");
		let now = Utc::now();
		insert_user_at(&pool, &newer, now).await;
		insert_user_at(&pool, &older, now - Duration::days(1)).await;

		let found = repo
			.find_by_email_with_roles("SHARED@x.com")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(found.id, older.id);
		assert!(repo
			.find_by_email_with_roles("nobody@x.com")
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_find_by_user_name_ignores_case_and_removed_users() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool.clone());
		let bob = insert_user(&pool, "bob", "b@x.com").await;

		let found = repo.find_by_user_name("BOB").await.unwrap().unwrap();
		assert_eq!(found.id, bob.id);

		sqlx::query("UPDATE users SET deleted_at = ? WHERE id = ?")
			.bind(Utc::now().to_rfc3339())
			.bind(bob.id.to_string())
			.execute(&pool)
			.await
			.unwrap();
		assert!(repo.find_by_user_name("bob").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_list_users_filters_before_paginating() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool.clone());
		insert_user(&pool, "bob", "b@x.com").await;
		insert_user(&pool, "alice", "a@x.com").await;
		insert_user(&pool, "carol", "carol@bobcorp.com").await;

		let (users, total) = repo
			.list_users(Some("BO"), UserOrder::default(), 0, 1)
			.await
			.unwrap();
		assert_eq!(total, 2);
		assert_eq!(users.len(), 1);
		assert_eq!(users[0].user_name, "bob");

		let (users, total) = repo
			.list_users(Some("bo"), UserOrder::default(), 1, 1)
			.await
			.unwrap();
		assert_eq!(total, 2);
		assert_eq!(users[0].user_name, "carol");
	}

	#[tokio::test]
	async fn test_list_users_blank_filter_and_ordering() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool.clone());
		insert_user(&pool, "bob", "z@x.com").await;
		insert_user(&pool, "Alice", "y@x.com").await;
		insert_user(&pool, "carol", "a@x.com").await;

		let (users, total) = repo
			.list_users(Some("   "), UserOrder::default(), 0, 10)
			.await
			.unwrap();
		assert_eq!(total, 3);
		let names: Vec<_> = users.iter().map(|u| u.user_name.as_str()).collect();
		assert_eq!(names, vec!["Alice", "bob", "carol"]);

		let order = UserOrder::new(UserSortField::Email, SortDirection::Descending);
		let (users, _) = repo.list_users(None, order, 0, 10).await.unwrap();
		let emails: Vec<_> = users.iter().map(|u| u.email.as_str()).collect();
		assert_eq!(emails, vec!["z@x.com", "y@x.com", "a@x.com"]);
	}

	#[tokio::test]
	async fn test_replace_user_roles_is_replace_all() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool.clone());
		let user = insert_user(&pool, "alice", "a@x.com").await;
		let a = insert_role(&pool, "A").await;
		let b = insert_role(&pool, "B").await;
		let c = insert_role(&pool, "C").await;

		repo.replace_user_roles(&user.id, &[a.id, b.id]).await.unwrap();
		repo
			.replace_user_roles(&user.id, &[c.id, c.id])
			.await
			.unwrap();

		let loaded = repo.find_by_id_with_roles(&user.id).await.unwrap().unwrap();
		assert_eq!(loaded.granted_role_ids(), vec![c.id]);

		repo.replace_user_roles(&user.id, &[]).await.unwrap();
		let loaded = repo.find_by_id_with_roles(&user.id).await.unwrap().unwrap();
		assert!(loaded.roles.is_empty());
	}

	#[tokio::test]
	async fn test_replace_user_roles_unknown_role_rolls_back() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool.clone());
		let user = insert_user(&pool, "alice", "a@x.com").await;
		let a = insert_role(&pool, "A").await;
		repo.replace_user_roles(&user.id, &[a.id]).await.unwrap();

		let result = repo
			.replace_user_roles(&user.id, &[RoleId::generate()])
			.await;
		assert!(result.is_err());

		let loaded = repo.find_by_id_with_roles(&user.id).await.unwrap().unwrap();
		assert_eq!(loaded.granted_role_ids(), vec![a.id]);
	}

	#[tokio::test]
	async fn test_replace_user_roles_requires_active_user() {
		let pool = create_test_pool().await;
		let repo = UserRepository::new(pool.clone());
		let user = insert_user(&pool, "alice", "a@x.com").await;
		let a = insert_role(&pool, "A").await;
		sqlx::query("UPDATE users SET deleted_at = ? WHERE id = ?")
			.bind(Utc::now().to_rfc3339())
			.bind(user.id.to_string())
			.execute(&pool)
			.await
			.unwrap();

		let removed = repo.replace_user_roles(&user.id, &[a.id]).await;
		let missing = repo.replace_user_roles(&UserId::generate(), &[a.id]).await;

		assert!(matches!(removed, Err(DbError::NotFound(_))));
		assert!(matches!(missing, Err(DbError::NotFound(_))));
		let links: i64 = sqlx::query("SELECT COUNT(*) as count FROM user_roles")
			.fetch_one(&pool)
			.await
			.unwrap()
			.get("count");
		assert_eq!(links, 0);
	}
}
