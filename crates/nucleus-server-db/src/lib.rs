// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for Nucleus user management.
//!
//! Each repository is paired with a store trait so services can be driven by
//! any implementation:
//! - [`UserRepository`] / [`UserStore`] - lookups, listing, role-link replacement
//! - [`CredentialRepository`] / [`CredentialStore`] - accounts and passwords
//! - [`RoleRepository`] / [`RoleCatalogue`] - roles, permissions, the member role

pub mod credential;
pub mod error;
pub mod pool;
pub mod role;
pub mod testing;
pub mod user;

pub use credential::{CredentialError, CredentialRepository, CredentialStore};
pub use error::DbError;
pub use pool::{create_pool, run_migrations};
pub use role::{RoleCatalogue, RoleRepository};
pub use user::{SortDirection, UserOrder, UserRepository, UserSortField, UserStore};
