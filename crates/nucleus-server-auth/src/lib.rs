// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain types for Nucleus user management.
//!
//! This crate holds everything about users and roles that does not touch storage:
//! typed identifiers, the [`User`] aggregate with its [`UserRole`] links, the
//! [`Role`]/[`Permission`] catalogue entities, the identity error taxonomy,
//! password policy and hashing, and the protected-account set.

mod argon2_config;
pub mod identity;
pub mod password;
pub mod protected;
pub mod role;
pub mod types;
pub mod user;
pub mod validation;

pub use identity::{IdentityError, IdentityErrorCode, IdentityFailure};
pub use password::{hash_password, verify_password, PasswordError, PasswordPolicy};
pub use protected::ProtectedAccounts;
pub use role::{Permission, Role};
pub use types::{PermissionId, RoleId, SecurityStamp, UserId};
pub use user::{User, UserRole};
pub use validation::{validate_email, validate_user_name};
