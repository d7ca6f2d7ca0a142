// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Nucleus server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`NUCLEUS_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use nucleus_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Using database {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub users: UsersConfig,
	pub password: PasswordConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`NUCLEUS_SERVER_*`)
/// 2. Config file (`/etc/nucleus/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		database: layer.database.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		users: layer.users.unwrap_or_default().finalize(),
		password: layer.password.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		database = %config.database.url,
		protected_accounts = config.users.protected_usernames.len(),
		member_role = %config.users.member_role,
		max_page_size = config.users.max_page_size,
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	let users = &config.users;
	if users.max_page_size == 0 {
		return Err(ConfigError::Validation(
			"users.max_page_size must be at least 1".to_string(),
		));
	}
	if users.default_page_size == 0 || users.default_page_size > users.max_page_size {
		return Err(ConfigError::Validation(format!(
			"users.default_page_size must be between 1 and users.max_page_size ({})",
			users.max_page_size
		)));
	}
	if users.member_role.trim().is_empty() {
		return Err(ConfigError::Validation(
			"users.member_role must not be blank".to_string(),
		));
	}
	if config.password.min_length == 0 {
		return Err(ConfigError::Validation(
			"password.min_length must be at least 1".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_defaults_are_valid() {
		let config = finalize(ServerConfigLayer::default()).unwrap();
		assert_eq!(config.database.url, "sqlite:./nucleus.db");
		assert_eq!(config.logging.level, "info");
		assert_eq!(config.users.member_role, "Member");
	}

	#[test]
	fn test_default_page_size_above_max_is_rejected() {
		let layer = ServerConfigLayer {
			users: Some(UsersConfigLayer {
				default_page_size: Some(50),
				max_page_size: Some(20),
				..Default::default()
			}),
			..Default::default()
		};
		let err = finalize(layer).unwrap_err();
		assert!(err.to_string().contains("default_page_size"));
	}

	#[test]
	fn test_blank_member_role_is_rejected() {
		let layer = ServerConfigLayer {
			users: Some(UsersConfigLayer {
				member_role: Some("  ".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_zero_max_page_size_is_rejected() {
		let layer = ServerConfigLayer {
			users: Some(UsersConfigLayer {
				max_page_size: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(finalize(layer).is_err());
	}

	#[test]
	fn test_file_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[users]\nprotected_usernames = [\"root\"]\ndefault_page_size = 25\n\n[password]\nmin_length = 8"
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		let config = finalize(layer).unwrap();

		assert_eq!(config.users.protected_usernames, vec!["root".to_string()]);
		assert_eq!(config.users.default_page_size, 25);
		assert_eq!(config.password.min_length, 8);
		assert!(config.password.require_digit);
	}
}
