// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read side of user management: listing and the create/edit form payload.

use std::sync::Arc;

use nucleus_server_auth::UserId;
use nucleus_server_db::{RoleCatalogue, UserStore};

use crate::dto::{
	GetUserForCreateOrUpdateOutput, PagedResult, RoleDto, UserDetail, UserListInput, UserListItem,
};
use crate::error::{Result, UserServiceError};
use crate::sort::parse_sort_key;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page size bounds applied to every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
	pub default_page_size: u32,
	pub max_page_size: u32,
}

impl Default for PageLimits {
	fn default() -> Self {
		Self {
			default_page_size: DEFAULT_PAGE_SIZE,
			max_page_size: MAX_PAGE_SIZE,
		}
	}
}

impl PageLimits {
	/// Zero means "use the default"; anything above the maximum is clamped.
	pub fn effective_page_size(&self, requested: u32) -> u32 {
		let size = if requested == 0 {
			self.default_page_size
		} else {
			requested
		};
		size.clamp(1, self.max_page_size.max(1))
	}
}

pub struct UserDirectory {
	users: Arc<dyn UserStore>,
	roles: Arc<dyn RoleCatalogue>,
	limits: PageLimits,
}

impl UserDirectory {
	pub fn new(users: Arc<dyn UserStore>, roles: Arc<dyn RoleCatalogue>, limits: PageLimits) -> Self {
		Self {
			users,
			roles,
			limits,
		}
	}

	/// Filters, counts, orders and pages the active users.
	///
	/// `total_count` is the size of the filtered set before paging.
	#[tracing::instrument(skip(self, input), fields(page_index = input.page_index))]
	pub async fn list_users(&self, input: &UserListInput) -> Result<PagedResult<UserListItem>> {
		let order = parse_sort_key(input.sort_by.as_deref())?;
		let page_size = self.limits.effective_page_size(input.page_size);
		let offset = i64::from(input.page_index) * i64::from(page_size);
		let filter = input
			.filter
			.as_deref()
			.map(str::trim)
			.filter(|f| !f.is_empty());

		let (users, total_count) = self
			.users
			.list_users(filter, order, offset, i64::from(page_size))
			.await?;

		tracing::debug!(
			returned = users.len(),
			total_count,
			page_size,
			"Listed users"
		);

		Ok(PagedResult {
			items: users.iter().map(UserListItem::from).collect(),
			total_count,
		})
	}

	/// Payload for the create/edit form.
	///
	/// A nil id returns only the role catalogue. Otherwise the user is loaded
	/// with its roles and the granted ids are reported in link order.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_for_create_or_update(
		&self,
		id: UserId,
	) -> Result<GetUserForCreateOrUpdateOutput> {
		let all_roles: Vec<RoleDto> = self
			.roles
			.list_all_roles()
			.await?
			.iter()
			.map(RoleDto::from)
			.collect();

		if id.is_nil() {
			return Ok(GetUserForCreateOrUpdateOutput {
				user: None,
				all_roles,
				granted_role_ids: Vec::new(),
			});
		}

		let user = self
			.users
			.find_by_id_with_roles(&id)
			.await?
			.ok_or_else(UserServiceError::user_not_found)?;

		Ok(GetUserForCreateOrUpdateOutput {
			granted_role_ids: user.granted_role_ids(),
			user: Some(UserDetail::from(&user)),
			all_roles,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn zero_page_size_uses_default() {
		assert_eq!(PageLimits::default().effective_page_size(0), DEFAULT_PAGE_SIZE);
	}

	#[test]
	fn oversized_page_is_clamped() {
		assert_eq!(PageLimits::default().effective_page_size(50_000), MAX_PAGE_SIZE);
		assert_eq!(PageLimits::default().effective_page_size(25), 25);
	}

	proptest! {
		#[test]
		fn effective_page_size_within_bounds(requested: u32, default in 1u32..500, max in 1u32..5000) {
			let limits = PageLimits { default_page_size: default, max_page_size: max };
			let size = limits.effective_page_size(requested);
			prop_assert!(size >= 1);
			prop_assert!(size <= max);
		}
	}
}
