// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Password policy configuration.

use nucleus_server_auth::password::DEFAULT_MIN_PASSWORD_LENGTH;
use nucleus_server_auth::PasswordPolicy;
use serde::Deserialize;

/// Password policy configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct PasswordConfig {
	pub min_length: usize,
	pub require_digit: bool,
	pub require_lowercase: bool,
	pub require_uppercase: bool,
	pub require_non_alphanumeric: bool,
}

impl Default for PasswordConfig {
	fn default() -> Self {
		PasswordConfigLayer::default().finalize()
	}
}

impl PasswordConfig {
	pub fn policy(&self) -> PasswordPolicy {
		PasswordPolicy {
			min_length: self.min_length,
			require_digit: self.require_digit,
			require_lowercase: self.require_lowercase,
			require_uppercase: self.require_uppercase,
			require_non_alphanumeric: self.require_non_alphanumeric,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordConfigLayer {
	#[serde(default)]
	pub min_length: Option<usize>,
	#[serde(default)]
	pub require_digit: Option<bool>,
	#[serde(default)]
	pub require_lowercase: Option<bool>,
	#[serde(default)]
	pub require_uppercase: Option<bool>,
	#[serde(default)]
	pub require_non_alphanumeric: Option<bool>,
}

impl PasswordConfigLayer {
	pub fn merge(&mut self, other: PasswordConfigLayer) {
		if other.min_length.is_some() {
			self.min_length = other.min_length;
		}
		if other.require_digit.is_some() {
			self.require_digit = other.require_digit;
		}
		if other.require_lowercase.is_some() {
			self.require_lowercase = other.require_lowercase;
		}
		if other.require_uppercase.is_some() {
			self.require_uppercase = other.require_uppercase;
		}
		if other.require_non_alphanumeric.is_some() {
			self.require_non_alphanumeric = other.require_non_alphanumeric;
		}
	}

	pub fn finalize(self) -> PasswordConfig {
		PasswordConfig {
			min_length: self.min_length.unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH),
			require_digit: self.require_digit.unwrap_or(true),
			require_lowercase: self.require_lowercase.unwrap_or(true),
			require_uppercase: self.require_uppercase.unwrap_or(true),
			require_non_alphanumeric: self.require_non_alphanumeric.unwrap_or(true),
		}
	}
}
