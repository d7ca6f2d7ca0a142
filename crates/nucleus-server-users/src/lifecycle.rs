// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Write side of user management.
//!
//! Every operation validates first and mutates after. Create and edit hand the
//! role links to the credential store together with the identity change, so
//! both land in one transaction or neither does.

use std::collections::HashSet;
use std::sync::Arc;

use nucleus_server_auth::{
	validate_email, validate_user_name, IdentityError, IdentityErrorCode, IdentityFailure,
	ProtectedAccounts, RoleId, User, UserId,
};
use nucleus_server_db::{CredentialStore, DbError, RoleCatalogue, UserStore};

use crate::dto::CreateOrUpdateUserInput;
use crate::error::{Result, UserServiceError};

pub struct UserLifecycleService {
	users: Arc<dyn UserStore>,
	credentials: Arc<dyn CredentialStore>,
	roles: Arc<dyn RoleCatalogue>,
	protected: ProtectedAccounts,
}

impl UserLifecycleService {
	pub fn new(
		users: Arc<dyn UserStore>,
		credentials: Arc<dyn CredentialStore>,
		roles: Arc<dyn RoleCatalogue>,
		protected: ProtectedAccounts,
	) -> Self {
		Self {
			users,
			credentials,
			roles,
			protected,
		}
	}

	pub fn protected_accounts(&self) -> &ProtectedAccounts {
		&self.protected
	}

	/// Creates an account and grants it exactly `granted_role_ids`.
	///
	/// A nil id in the input is replaced with a generated one.
	///
	/// # Returns
	/// The id of the new user.
	#[tracing::instrument(skip(self, input), fields(user_id = tracing::field::Empty))]
	pub async fn create_user(&self, input: CreateOrUpdateUserInput) -> Result<UserId> {
		let role_ids = distinct_role_ids(&input.granted_role_ids);
		self.ensure_roles_exist(&role_ids).await?;

		let user = User::new(input.user.id, input.user.user_name, input.user.email);
		tracing::Span::current().record("user_id", tracing::field::display(&user.id));
		let password = input.user.password.as_deref().unwrap_or_default();

		if let Err(e) = self
			.credentials
			.create_account(&user, password, &role_ids)
			.await
		{
			tracing::warn!(error = %e, "Account creation rejected");
			return Err(e.into());
		}

		tracing::info!(user_id = %user.id, roles = role_ids.len(), "Created user");
		Ok(user.id)
	}

	/// Updates name, email, optionally the password, and the granted roles.
	///
	/// An empty or missing password leaves the current credential in place.
	#[tracing::instrument(skip(self, input), fields(user_id = %input.user.id))]
	pub async fn edit_user(&self, input: CreateOrUpdateUserInput) -> Result<()> {
		let CreateOrUpdateUserInput {
			user: fields,
			granted_role_ids,
		} = input;

		let mut user = self
			.users
			.find_by_id_with_roles(&fields.id)
			.await?
			.ok_or_else(UserServiceError::user_not_found)?;

		if let Some(existing) = self.users.find_by_user_name(&fields.user_name).await? {
			if existing.id != user.id {
				tracing::warn!(user_id = %user.id, "Requested user name belongs to another user");
				return Err(IdentityError::user_name_already_exists(&fields.user_name).into());
			}
		}

		let field_errors: Vec<IdentityError> =
			[validate_user_name(&fields.user_name), validate_email(&fields.email)]
				.into_iter()
				.filter_map(std::result::Result::err)
				.collect();
		if let Some(failure) = IdentityFailure::from_errors(field_errors) {
			return Err(failure.into());
		}

		let role_ids = distinct_role_ids(&granted_role_ids);
		self.ensure_roles_exist(&role_ids).await?;

		if let Some(password) = fields.password.as_deref().filter(|p| !p.is_empty()) {
			self.rotate_password(&mut user, password).await?;
		}

		user.user_name = fields.user_name;
		user.email = fields.email;
		user.clear_roles();
		user.rotate_security_stamp();

		if let Err(e) = self.credentials.update_account(&user, &role_ids).await {
			tracing::warn!(user_id = %user.id, error = %e, "Account update rejected");
			return Err(e.into());
		}

		tracing::info!(user_id = %user.id, roles = role_ids.len(), "Updated user");
		Ok(())
	}

	/// Removes an account unless it is protected.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn remove_user(&self, id: UserId) -> Result<()> {
		let mut user = self
			.users
			.find_by_id_with_roles(&id)
			.await?
			.ok_or_else(UserServiceError::user_not_found)?;

		if self.protected.contains(&user.user_name) {
			tracing::warn!(user_id = %id, "Refusing to remove protected account");
			return Err(IdentityError::cannot_remove_system_user(&user.user_name).into());
		}

		self.credentials.delete_account(&user).await?;
		user.clear_roles();

		tracing::info!(user_id = %id, "Removed user");
		Ok(())
	}

	/// Enrolls the user with `email` in the member role.
	///
	/// This is a replace: any roles granted before are dropped and the user
	/// ends up holding the member role only.
	#[tracing::instrument(skip(self, email))]
	pub async fn grant_member_role(&self, email: &str) -> Result<()> {
		let user = self
			.users
			.find_by_email_with_roles(email)
			.await?
			.ok_or_else(UserServiceError::user_not_found)?;

		let member = self.roles.get_member_role().await.map_err(|e| match e {
			DbError::NotFound(message) => {
				UserServiceError::from(IdentityError::new(IdentityErrorCode::RoleNotFound, message))
			}
			other => other.into(),
		})?;

		let previous = user.roles.len();
		self.users.replace_user_roles(&user.id, &[member.id]).await?;

		tracing::info!(
			user_id = %user.id,
			replaced = previous,
			"Granted member role"
		);
		Ok(())
	}

	/// Makes `role_ids` the user's complete set of granted roles.
	///
	/// The user must exist and not be removed, and every role id must be in
	/// the catalogue; otherwise nothing changes.
	#[tracing::instrument(skip(self, role_ids), fields(user_id = %user_id, count = role_ids.len()))]
	pub async fn replace_roles(&self, user_id: &UserId, role_ids: &[RoleId]) -> Result<()> {
		if self.users.find_by_id_with_roles(user_id).await?.is_none() {
			return Err(UserServiceError::user_not_found());
		}

		let role_ids = distinct_role_ids(role_ids);
		self.ensure_roles_exist(&role_ids).await?;

		match self.users.replace_user_roles(user_id, &role_ids).await {
			Ok(()) => Ok(()),
			// Removed between the lookup and the write.
			Err(DbError::NotFound(_)) => Err(UserServiceError::user_not_found()),
			Err(e) => Err(e.into()),
		}
	}

	/// Remove-then-set, with the policy checked up front so a rejected
	/// password never leaves the account without one.
	async fn rotate_password(&self, user: &mut User, password: &str) -> Result<()> {
		self.credentials.validate_password(password).await?;
		self.credentials.remove_credential(user).await?;
		self.credentials.set_credential(user, password).await?;
		tracing::debug!(user_id = %user.id, "Password rotated");
		Ok(())
	}

	async fn ensure_roles_exist(&self, role_ids: &[RoleId]) -> Result<()> {
		if role_ids.is_empty() {
			return Ok(());
		}

		let found: HashSet<RoleId> = self
			.roles
			.find_roles_by_ids(role_ids)
			.await?
			.into_iter()
			.map(|role| role.id)
			.collect();

		let missing: Vec<IdentityError> = role_ids
			.iter()
			.filter(|id| !found.contains(id))
			.map(|id| IdentityError::role_not_found(id))
			.collect();

		match IdentityFailure::from_errors(missing) {
			Some(failure) => Err(failure.into()),
			None => Ok(()),
		}
	}
}

/// Drops repeated ids, keeping the first occurrence.
fn distinct_role_ids(role_ids: &[RoleId]) -> Vec<RoleId> {
	let mut seen = HashSet::with_capacity(role_ids.len());
	role_ids
		.iter()
		.copied()
		.filter(|id| seen.insert(*id))
		.collect()
}
