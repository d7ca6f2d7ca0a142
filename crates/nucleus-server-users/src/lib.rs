// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User management service.
//!
//! - [`UserDirectory`] - filtered, sorted, paged listing and the create/edit form payload
//! - [`UserLifecycleService`] - create, edit, remove, role replacement, member enrollment
//!
//! Both are built over the store traits of `nucleus-server-db` and share
//! [`UserServiceError`].

pub mod directory;
pub mod dto;
pub mod error;
pub mod lifecycle;
pub mod sort;

pub use directory::{PageLimits, UserDirectory, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use dto::{
	CreateOrUpdateUserInput, GetUserForCreateOrUpdateOutput, PagedResult, PermissionDto, RoleDto,
	UserDetail, UserInput, UserListInput, UserListItem,
};
pub use error::UserServiceError;
pub use lifecycle::UserLifecycleService;
pub use sort::parse_sort_key;
