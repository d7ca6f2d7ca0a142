// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use nucleus_server_config::{PasswordConfig, UsersConfig};
use nucleus_server_db::{CredentialRepository, RoleRepository, UserRepository};
use nucleus_server_users::{PageLimits, UserDirectory, UserLifecycleService};
use sqlx::SqlitePool;

/// The user management services over one pool, plus the repositories the
/// seeding code needs directly.
pub struct UserServices {
	pub directory: UserDirectory,
	pub lifecycle: UserLifecycleService,
	pub users: UserRepository,
	pub roles: RoleRepository,
}

impl UserServices {
	pub fn new(pool: SqlitePool, users_config: &UsersConfig, password_config: &PasswordConfig) -> Self {
		let users = UserRepository::new(pool.clone());
		let roles = RoleRepository::new(pool.clone(), users_config.member_role.clone());
		let credentials = CredentialRepository::new(pool, password_config.policy());

		let directory = UserDirectory::new(
			Arc::new(users.clone()),
			Arc::new(roles.clone()),
			PageLimits {
				default_page_size: users_config.default_page_size,
				max_page_size: users_config.max_page_size,
			},
		);
		let lifecycle = UserLifecycleService::new(
			Arc::new(users.clone()),
			Arc::new(credentials),
			Arc::new(roles.clone()),
			users_config.protected_accounts(),
		);

		Self {
			directory,
			lifecycle,
			users,
			roles,
		}
	}
}
