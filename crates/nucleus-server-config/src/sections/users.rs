// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User management configuration.

use nucleus_server_auth::ProtectedAccounts;
use serde::Deserialize;

const DEFAULT_MEMBER_ROLE: &str = "Member";
const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 1000;

/// User management configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct UsersConfig {
	/// Accounts that can never be removed.
	pub protected_usernames: Vec<String>,
	/// Role granted by default-role enrollment.
	pub member_role: String,
	pub default_page_size: u32,
	pub max_page_size: u32,
}

impl Default for UsersConfig {
	fn default() -> Self {
		UsersConfigLayer::default().finalize()
	}
}

impl UsersConfig {
	pub fn protected_accounts(&self) -> ProtectedAccounts {
		ProtectedAccounts::new(&self.protected_usernames)
	}
}

/// User management configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersConfigLayer {
	#[serde(default)]
	pub protected_usernames: Option<Vec<String>>,
	#[serde(default)]
	pub member_role: Option<String>,
	#[serde(default)]
	pub default_page_size: Option<u32>,
	#[serde(default)]
	pub max_page_size: Option<u32>,
}

impl UsersConfigLayer {
	pub fn merge(&mut self, other: UsersConfigLayer) {
		if other.protected_usernames.is_some() {
			self.protected_usernames = other.protected_usernames;
		}
		if other.member_role.is_some() {
			self.member_role = other.member_role;
		}
		if other.default_page_size.is_some() {
			self.default_page_size = other.default_page_size;
		}
		if other.max_page_size.is_some() {
			self.max_page_size = other.max_page_size;
		}
	}

	pub fn finalize(self) -> UsersConfig {
		UsersConfig {
			protected_usernames: self
				.protected_usernames
				.unwrap_or_else(|| vec!["admin".to_string()]),
			member_role: self
				.member_role
				.unwrap_or_else(|| DEFAULT_MEMBER_ROLE.to_string()),
			default_page_size: self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
			max_page_size: self.max_page_size.unwrap_or(MAX_PAGE_SIZE),
		}
	}
}
