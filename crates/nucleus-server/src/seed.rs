// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default permissions, roles and system accounts.
//!
//! Seeding only ever inserts what is missing, so running it repeatedly is safe.

use nucleus_server_auth::{Permission, Role, UserId};
use nucleus_server_db::DbError;
use nucleus_server_users::{CreateOrUpdateUserInput, UserInput, UserServiceError};

use crate::services::UserServices;

pub const ADMIN_ROLE: &str = "Admin";

/// Environment variable holding the initial password of system accounts.
pub const ADMIN_PASSWORD_ENV: &str = "NUCLEUS_SERVER_ADMIN_PASSWORD";

const SYSTEM_EMAIL_DOMAIN: &str = "nucleus.local";

const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
	("permissions.users.read", "View users"),
	("permissions.users.create", "Create users"),
	("permissions.users.update", "Edit users"),
	("permissions.users.delete", "Remove users"),
	("permissions.roles.read", "View roles"),
];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
	#[error(transparent)]
	Database(#[from] DbError),

	#[error(transparent)]
	Users(#[from] UserServiceError),

	#[error("system account '{user_name}' does not exist and NUCLEUS_SERVER_ADMIN_PASSWORD is not set")]
	MissingAdminPassword { user_name: String },
}

/// What a seeding run inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
	pub permissions_created: usize,
	pub roles_created: usize,
	pub accounts_created: usize,
}

/// Ensures the default catalogue and one account per protected user name.
///
/// The `Admin` role carries every default permission; the member role
/// carries none. New system accounts are granted `Admin`.
#[tracing::instrument(skip(services, admin_password))]
pub async fn seed(
	services: &UserServices,
	admin_password: Option<&str>,
) -> Result<SeedReport, SeedError> {
	let mut report = SeedReport::default();

	let mut permissions = Vec::with_capacity(DEFAULT_PERMISSIONS.len());
	for (name, display_name) in DEFAULT_PERMISSIONS {
		let permission = match services.roles.find_permission_by_name(name).await? {
			Some(existing) => existing,
			None => {
				let permission = Permission::new(*name, *display_name);
				services.roles.create_permission(&permission).await?;
				report.permissions_created += 1;
				permission
			}
		};
		permissions.push(permission);
	}

	let admin = ensure_role(services, ADMIN_ROLE, &mut report).await?;
	for permission in &permissions {
		services
			.roles
			.grant_permission(&admin.id, &permission.id)
			.await?;
	}
	let member_role = services.roles.member_role_name().to_string();
	ensure_role(services, &member_role, &mut report).await?;

	let protected: Vec<String> = services
		.lifecycle
		.protected_accounts()
		.iter()
		.map(str::to_string)
		.collect();
	for user_name in protected {
		if services.users.find_by_user_name(&user_name).await?.is_some() {
			continue;
		}
		let password = admin_password
			.filter(|p| !p.is_empty())
			.ok_or_else(|| SeedError::MissingAdminPassword {
				user_name: user_name.clone(),
			})?;

		let id = services
			.lifecycle
			.create_user(CreateOrUpdateUserInput {
				user: UserInput {
					id: UserId::nil(),
					email: format!("{user_name}@{SYSTEM_EMAIL_DOMAIN}"),
					user_name,
					password: Some(password.to_string()),
				},
				granted_role_ids: vec![admin.id],
			})
			.await?;
		tracing::info!(user_id = %id, "Created system account");
		report.accounts_created += 1;
	}

	tracing::info!(
		permissions_created = report.permissions_created,
		roles_created = report.roles_created,
		accounts_created = report.accounts_created,
		"Seeding complete"
	);
	Ok(report)
}

async fn ensure_role(
	services: &UserServices,
	name: &str,
	report: &mut SeedReport,
) -> Result<Role, SeedError> {
	if let Some(role) = services.roles.find_role_by_name(name).await? {
		return Ok(role);
	}
	let role = Role::new(name);
	services.roles.create_role(&role).await?;
	report.roles_created += 1;
	Ok(role)
}
