// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Credential store: account existence and password credentials.
//!
//! Every write that touches credentials or identity fields persists a fresh
//! security stamp. Business rejections (weak password, taken user name) come
//! back as [`CredentialError::Rejected`] so callers can pass the codes through.

use async_trait::async_trait;
use chrono::Utc;
use nucleus_server_auth::{
	hash_password, validate_email, validate_user_name, verify_password, IdentityError,
	IdentityErrorCode, IdentityFailure, PasswordError, PasswordPolicy, RoleId, SecurityStamp, User,
	UserId,
};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::{is_unique_violation, DbError};
use crate::user::write_role_links;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
	#[error("credential operation rejected: {0}")]
	Rejected(#[from] IdentityFailure),

	#[error(transparent)]
	Password(#[from] PasswordError),

	#[error(transparent)]
	Database(#[from] DbError),
}

impl From<sqlx::Error> for CredentialError {
	fn from(e: sqlx::Error) -> Self {
		CredentialError::Database(DbError::Sqlx(e))
	}
}

impl From<IdentityError> for CredentialError {
	fn from(e: IdentityError) -> Self {
		CredentialError::Rejected(e.into())
	}
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
	/// Check a password against the store's policy without writing anything.
	async fn validate_password(&self, password: &str) -> Result<(), CredentialError>;
	/// Create the account row with a hashed password, linked to exactly `role_ids`.
	/// Nothing is stored unless every write succeeds.
	async fn create_account(
		&self,
		user: &User,
		password: &str,
		role_ids: &[RoleId],
	) -> Result<(), CredentialError>;
	/// Persist user name, email and security stamp and replace the role links
	/// with `role_ids`, atomically.
	async fn update_account(&self, user: &User, role_ids: &[RoleId]) -> Result<(), CredentialError>;
	/// Remove the account and its role links.
	async fn delete_account(&self, user: &User) -> Result<(), CredentialError>;
	/// Clear the password. The new stamp is written back into `user`.
	async fn remove_credential(&self, user: &mut User) -> Result<(), CredentialError>;
	/// Add a password to an account without one. The new stamp is written back into `user`.
	async fn set_credential(&self, user: &mut User, password: &str) -> Result<(), CredentialError>;
	/// Returns true if `password` matches the stored credential.
	async fn verify_credential(&self, user_id: &UserId, password: &str)
		-> Result<bool, CredentialError>;
}

#[async_trait]
impl CredentialStore for CredentialRepository {
	async fn validate_password(&self, password: &str) -> Result<(), CredentialError> {
		self.validate_password(password)
	}

	async fn create_account(
		&self,
		user: &User,
		password: &str,
		role_ids: &[RoleId],
	) -> Result<(), CredentialError> {
		self.create_account(user, password, role_ids).await
	}

	async fn update_account(&self, user: &User, role_ids: &[RoleId]) -> Result<(), CredentialError> {
		self.update_account(user, role_ids).await
	}

	async fn delete_account(&self, user: &User) -> Result<(), CredentialError> {
		self.delete_account(user).await
	}

	async fn remove_credential(&self, user: &mut User) -> Result<(), CredentialError> {
		self.remove_credential(user).await
	}

	async fn set_credential(&self, user: &mut User, password: &str) -> Result<(), CredentialError> {
		self.set_credential(user, password).await
	}

	async fn verify_credential(
		&self,
		user_id: &UserId,
		password: &str,
	) -> Result<bool, CredentialError> {
		self.verify_credential(user_id, password).await
	}
}

/// SQLite-backed credential store.
#[derive(Clone)]
pub struct CredentialRepository {
	pool: SqlitePool,
	policy: PasswordPolicy,
}

impl CredentialRepository {
	/// Create a new credential store.
	///
	/// # Arguments
	/// * `pool` - SQLite connection pool
	/// * `policy` - Rules every new password must satisfy
	pub fn new(pool: SqlitePool, policy: PasswordPolicy) -> Self {
		Self { pool, policy }
	}

	pub fn validate_password(&self, password: &str) -> Result<(), CredentialError> {
		self.policy.validate(password)?;
		Ok(())
	}

	/// Create an account and its role links in one transaction.
	///
	/// # Errors
	/// Returns `CredentialError::Rejected` with every format and policy
	/// violation found, or `DuplicateUserName` if an active user already has
	/// the name. A failed link write rolls the account back.
	#[tracing::instrument(skip(self, user, password, role_ids), fields(user_id = %user.id, roles = role_ids.len()))]
	pub async fn create_account(
		&self,
		user: &User,
		password: &str,
		role_ids: &[RoleId],
	) -> Result<(), CredentialError> {
		let mut errors = identity_errors(user);
		if let Err(failure) = self.policy.validate(password) {
			errors.extend(failure.errors().iter().cloned());
		}
		if let Some(failure) = IdentityFailure::from_errors(errors) {
			return Err(failure.into());
		}

		if self.user_name_taken(&user.user_name, None).await? {
			return Err(IdentityError::duplicate_user_name(&user.user_name).into());
		}

		let password_hash = hash_password(password)?;
		let mut tx = self.pool.begin().await?;
		let result = sqlx::query(
			r#"
			INSERT INTO users (id, user_name, email, password_hash, security_stamp, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.user_name)
		.bind(&user.email)
		.bind(&password_hash)
		.bind(user.security_stamp.as_str())
		.bind(user.created_at.to_rfc3339())
		.bind(user.updated_at.to_rfc3339())
		.execute(&mut *tx)
		.await;

		match result {
			Ok(_) => {}
			Err(e) if is_unique_violation(&e) => {
				return Err(IdentityError::duplicate_user_name(&user.user_name).into());
			}
			Err(e) => return Err(e.into()),
		}

		write_role_links(&mut tx, &user.id, role_ids).await?;
		tx.commit().await?;

		tracing::debug!(user_id = %user.id, "account created");
		Ok(())
	}

	/// Persist user name, email and security stamp of an active account.
	///
	/// # Errors
	/// Returns `CredentialError::Rejected` for invalid fields, `DuplicateUserName`
	/// if another active user has the name, or `UserNotFound` if the account is
	/// gone.
	///
	/// Role links are replaced with `role_ids` in the same transaction.
	#[tracing::instrument(skip(self, user, role_ids), fields(user_id = %user.id, roles = role_ids.len()))]
	pub async fn update_account(
		&self,
		user: &User,
		role_ids: &[RoleId],
	) -> Result<(), CredentialError> {
		if let Some(failure) = IdentityFailure::from_errors(identity_errors(user)) {
			return Err(failure.into());
		}

		if self.user_name_taken(&user.user_name, Some(&user.id)).await? {
			return Err(IdentityError::duplicate_user_name(&user.user_name).into());
		}

		let mut tx = self.pool.begin().await?;
		let result = sqlx::query(
			r#"
			UPDATE users
			SET user_name = ?, email = ?, security_stamp = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(&user.user_name)
		.bind(&user.email)
		.bind(user.security_stamp.as_str())
		.bind(Utc::now().to_rfc3339())
		.bind(user.id.to_string())
		.execute(&mut *tx)
		.await;

		let result = match result {
			Ok(result) => result,
			Err(e) if is_unique_violation(&e) => {
				return Err(IdentityError::duplicate_user_name(&user.user_name).into());
			}
			Err(e) => return Err(e.into()),
		};
		if result.rows_affected() == 0 {
			return Err(IdentityError::user_not_found().into());
		}

		write_role_links(&mut tx, &user.id, role_ids).await?;
		tx.commit().await?;

		tracing::debug!(user_id = %user.id, "account updated");
		Ok(())
	}

	/// Remove an account.
	///
	/// The row is kept with `deleted_at` set, its password cleared and its
	/// stamp rotated; role links are deleted. The user name becomes free.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn delete_account(&self, user: &User) -> Result<(), CredentialError> {
		let now = Utc::now().to_rfc3339();
		let user_id = user.id.to_string();
		let mut tx = self.pool.begin().await?;

		let result = sqlx::query(
			r#"
			UPDATE users
			SET deleted_at = ?, updated_at = ?, password_hash = NULL, security_stamp = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(&now)
		.bind(&now)
		.bind(SecurityStamp::generate().as_str())
		.bind(&user_id)
		.execute(&mut *tx)
		.await?;

		if result.rows_affected() == 0 {
			return Err(IdentityError::user_not_found().into());
		}

		sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
			.bind(&user_id)
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		tracing::debug!(user_id = %user.id, "account deleted");
		Ok(())
	}

	/// Clear the stored password.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn remove_credential(&self, user: &mut User) -> Result<(), CredentialError> {
		let stamp = SecurityStamp::generate();
		let result = sqlx::query(
			r#"
			UPDATE users
			SET password_hash = NULL, security_stamp = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(stamp.as_str())
		.bind(Utc::now().to_rfc3339())
		.bind(user.id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(IdentityError::user_not_found().into());
		}

		user.security_stamp = stamp;
		tracing::debug!(user_id = %user.id, "credential removed");
		Ok(())
	}

	/// Add a password to an account that has none.
	///
	/// # Errors
	/// Returns `CredentialError::Rejected` with the policy violations, or
	/// `UserAlreadyHasPassword` if a credential is still present.
	#[tracing::instrument(skip(self, user, password), fields(user_id = %user.id))]
	pub async fn set_credential(
		&self,
		user: &mut User,
		password: &str,
	) -> Result<(), CredentialError> {
		self.policy.validate(password)?;

		let row = sqlx::query(
			r#"
			SELECT password_hash
			FROM users
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(user.id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Err(IdentityError::user_not_found().into());
		};
		let existing: Option<String> = row.get("password_hash");
		if existing.is_some() {
			return Err(
				IdentityError::new(
					IdentityErrorCode::UserAlreadyHasPassword,
					"User already has a password set.",
				)
				.into(),
			);
		}

		let password_hash = hash_password(password)?;
		let stamp = SecurityStamp::generate();
		sqlx::query(
			r#"
			UPDATE users
			SET password_hash = ?, security_stamp = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(&password_hash)
		.bind(stamp.as_str())
		.bind(Utc::now().to_rfc3339())
		.bind(user.id.to_string())
		.execute(&self.pool)
		.await?;

		user.security_stamp = stamp;
		tracing::debug!(user_id = %user.id, "credential set");
		Ok(())
	}

	/// Check a password against the stored hash.
	///
	/// # Returns
	/// `false` for unknown or removed users and for accounts without a password.
	#[tracing::instrument(skip(self, password), fields(user_id = %user_id))]
	pub async fn verify_credential(
		&self,
		user_id: &UserId,
		password: &str,
	) -> Result<bool, CredentialError> {
		let row = sqlx::query(
			r#"
			SELECT password_hash
			FROM users
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		let hash: Option<String> = row.and_then(|r| r.get("password_hash"));
		match hash {
			Some(hash) => Ok(verify_password(password, &hash)?),
			None => Ok(false),
		}
	}

	async fn user_name_taken(
		&self,
		user_name: &str,
		except: Option<&UserId>,
	) -> Result<bool, CredentialError> {
		let row = sqlx::query(
			r#"
			SELECT id
			FROM users
			WHERE user_name = ? COLLATE NOCASE AND deleted_at IS NULL
			"#,
		)
		.bind(user_name)
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(false);
		};
		let id: String = row.get("id");
		Ok(except.map_or(true, |except| except.to_string() != id))
	}
}

fn identity_errors(user: &User) -> Vec<IdentityError> {
	[validate_user_name(&user.user_name), validate_email(&user.email)]
		.into_iter()
		.filter_map(Result::err)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use crate::user::UserRepository;
	use nucleus_server_auth::Role;

	fn rejected_code(err: CredentialError) -> IdentityErrorCode {
		match err {
			CredentialError::Rejected(failure) => failure.code(),
			other => panic!("expected rejection, got {other:?}"),
		}
	}

	async fn make_store() -> (CredentialRepository, UserRepository, SqlitePool) {
		let pool = create_test_pool().await;
		(
			CredentialRepository::new(pool.clone(), PasswordPolicy::default()),
			UserRepository::new(pool.clone()),
			pool,
		)
	}

	#[tokio::test]
	async fn test_create_account_and_verify() {
		let (store, users, _) = make_store().await;
		let user = User::new(UserId::nil(), "alice", "a@x.com");

		store.create_account(&user, "Pwd1!", &[]).await.unwrap();

		let loaded = users.find_by_id_with_roles(&user.id).await.unwrap().unwrap();
		assert_eq!(loaded.user_name, "alice");
		assert_eq!(loaded.security_stamp, user.security_stamp);
		assert!(store.verify_credential(&user.id, "Pwd1!").await.unwrap());
		assert!(!store.verify_credential(&user.id, "Wrong1!").await.unwrap());
	}

	#[tokio::test]
	async fn test_create_account_rejects_weak_password_and_bad_fields() {
		let (store, users, _) = make_store().await;
		let user = User::new(UserId::nil(), "bad name", "nope");

		let err = store.create_account(&user, "weak", &[]).await.unwrap_err();
		let CredentialError::Rejected(failure) = err else {
			panic!("expected rejection");
		};
		assert!(failure.has_code(IdentityErrorCode::InvalidUserName));
		assert!(failure.has_code(IdentityErrorCode::InvalidEmail));
		assert!(failure.has_code(IdentityErrorCode::PasswordTooShort));
		assert!(users.find_by_id_with_roles(&user.id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_create_account_duplicate_user_name() {
		let (store, _, _) = make_store().await;
		store
			.create_account(&User::new(UserId::nil(), "alice", "a@x.com"), "Pwd1!", &[])
			.await
			.unwrap();

		let err = store
			.create_account(&User::new(UserId::nil(), "ALICE", "b@x.com"), "Pwd1!", &[])
			.await
			.unwrap_err();
		assert_eq!(rejected_code(err), IdentityErrorCode::DuplicateUserName);
	}

	#[tokio::test]
	async fn test_update_account_persists_fields() {
		let (store, users, _) = make_store().await;
		let mut user = User::new(UserId::nil(), "alice", "a@x.com");
		store.create_account(&user, "Pwd1!", &[]).await.unwrap();

		user.user_name = "alicia".to_string();
		user.email = "alicia@x.com".to_string();
		user.rotate_security_stamp();
		store.update_account(&user, &[]).await.unwrap();

		let loaded = users.find_by_id_with_roles(&user.id).await.unwrap().unwrap();
		assert_eq!(loaded.user_name, "alicia");
		assert_eq!(loaded.email, "alicia@x.com");
		assert_eq!(loaded.security_stamp, user.security_stamp);
	}

	#[tokio::test]
	async fn test_update_account_rejects_taken_name_but_not_own() {
		let (store, _, _) = make_store().await;
		let alice = User::new(UserId::nil(), "alice", "a@x.com");
		let mut bob = User::new(UserId::nil(), "bob", "b@x.com");
		store.create_account(&alice, "Pwd1!", &[]).await.unwrap();
		store.create_account(&bob, "Pwd1!", &[]).await.unwrap();

		store.update_account(&bob, &[]).await.unwrap();

		bob.user_name = "alice".to_string();
		let err = store.update_account(&bob, &[]).await.unwrap_err();
		assert_eq!(rejected_code(err), IdentityErrorCode::DuplicateUserName);
	}

	#[tokio::test]
	async fn test_delete_account_soft_deletes_and_frees_name() {
		let (store, users, pool) = make_store().await;
		let user = User::new(UserId::nil(), "alice", "a@x.com");
		store.create_account(&user, "Pwd1!", &[]).await.unwrap();

		let role = Role::new("Member");
		crate::role::RoleRepository::new(pool.clone(), "Member")
			.create_role(&role)
			.await
			.unwrap();
		users.replace_user_roles(&user.id, &[role.id]).await.unwrap();

		store.delete_account(&user).await.unwrap();

		assert!(users.find_by_id_with_roles(&user.id).await.unwrap().is_none());
		assert!(!store.verify_credential(&user.id, "Pwd1!").await.unwrap());
		let links: i64 = sqlx::query("SELECT COUNT(*) as count FROM user_roles")
			.fetch_one(&pool)
			.await
			.unwrap()
			.get("count");
		assert_eq!(links, 0);

		store
			.create_account(&User::new(UserId::nil(), "alice", "a2@x.com"), "Pwd1!", &[])
			.await
			.unwrap();

		let err = store.delete_account(&user).await.unwrap_err();
		assert_eq!(rejected_code(err), IdentityErrorCode::UserNotFound);
	}

	#[tokio::test]
	async fn test_remove_then_set_credential_rotates_password() {
		let (store, _, _) = make_store().await;
		let mut user = User::new(UserId::nil(), "alice", "a@x.com");
		store.create_account(&user, "Pwd1!", &[]).await.unwrap();
		let original_stamp = user.security_stamp.clone();

		let err = store.set_credential(&mut user, "New2@").await.unwrap_err();
		assert_eq!(rejected_code(err), IdentityErrorCode::UserAlreadyHasPassword);

		store.remove_credential(&mut user).await.unwrap();
		assert_ne!(user.security_stamp, original_stamp);
		assert!(!store.verify_credential(&user.id, "Pwd1!").await.unwrap());

		store.set_credential(&mut user, "New2@").await.unwrap();
		assert!(store.verify_credential(&user.id, "New2@").await.unwrap());
	}

	#[tokio::test]
	async fn test_set_credential_rejects_weak_password() {
		let (store, _, _) = make_store().await;
		let mut user = User::new(UserId::nil(), "alice", "a@x.com");
		store.create_account(&user, "Pwd1!", &[]).await.unwrap();
		store.remove_credential(&mut user).await.unwrap();

		let err = store.set_credential(&mut user, "weak").await.unwrap_err();
		assert_eq!(rejected_code(err), IdentityErrorCode::PasswordTooShort);
		assert!(store.validate_password("Pwd1!").is_ok());
	}

	#[tokio::test]
	async fn test_create_account_links_roles() {
		let (store, users, pool) = make_store().await;
		let role = Role::new("Editors");
		crate::role::RoleRepository::new(pool.clone(), "Member")
			.create_role(&role)
			.await
			.unwrap();
		let user = User::new(UserId::nil(), "alice", "a@x.com");

		store
			.create_account(&user, "Pwd1!", &[role.id, role.id])
			.await
			.unwrap();

		let loaded = users.find_by_id_with_roles(&user.id).await.unwrap().unwrap();
		assert_eq!(loaded.granted_role_ids(), vec![role.id]);
	}

	#[tokio::test]
	async fn test_create_account_failed_link_rolls_back_account() {
		let (store, users, _) = make_store().await;
		let user = User::new(UserId::nil(), "alice", "a@x.com");

		let err = store
			.create_account(&user, "Pwd1!", &[RoleId::generate()])
			.await
			.unwrap_err();

		assert!(matches!(err, CredentialError::Database(_)));
		assert!(users.find_by_user_name("alice").await.unwrap().is_none());
		store
			.create_account(&User::new(UserId::nil(), "alice", "a@x.com"), "Pwd1!", &[])
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_update_account_failed_link_keeps_previous_state() {
		let (store, users, pool) = make_store().await;
		let role = Role::new("Editors");
		crate::role::RoleRepository::new(pool.clone(), "Member")
			.create_role(&role)
			.await
			.unwrap();
		let mut user = User::new(UserId::nil(), "alice", "a@x.com");
		store.create_account(&user, "Pwd1!", &[role.id]).await.unwrap();

		user.user_name = "alicia".to_string();
		let result = store.update_account(&user, &[RoleId::generate()]).await;

		assert!(result.is_err());
		let loaded = users.find_by_id_with_roles(&user.id).await.unwrap().unwrap();
		assert_eq!(loaded.user_name, "alice");
		assert_eq!(loaded.granted_role_ids(), vec![role.id]);
	}
}
