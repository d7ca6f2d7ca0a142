// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The immutable set of accounts the system depends on.

use std::collections::BTreeSet;

/// User names that can never be removed.
///
/// Built once from configuration and handed to the services that need it.
/// Matching ignores ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedAccounts {
	user_names: BTreeSet<String>,
}

impl ProtectedAccounts {
	pub fn new<I, S>(user_names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self {
			user_names: user_names
				.into_iter()
				.map(|name| name.as_ref().trim().to_ascii_lowercase())
				.filter(|name| !name.is_empty())
				.collect(),
		}
	}

	pub fn contains(&self, user_name: &str) -> bool {
		self.user_names.contains(&user_name.to_ascii_lowercase())
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.user_names.iter().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.user_names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.user_names.is_empty()
	}
}
