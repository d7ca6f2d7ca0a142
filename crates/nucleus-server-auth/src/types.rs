// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions shared by the user management crates.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs ([`UserId`], [`RoleId`],
//!   [`PermissionId`]) preventing accidental mixing
//! - **Security stamp**: the opaque token rotated on every credential or identity change
//!
//! All ID types implement transparent serde serialization (as UUID strings) and
//! provide conversion to/from [`uuid::Uuid`]. The nil UUID is the "no entity yet"
//! sentinel used by create forms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// The nil sentinel, meaning "no entity".
			pub fn nil() -> Self {
				Self(Uuid::nil())
			}

			/// Returns true if this is the nil sentinel.
			pub fn is_nil(&self) -> bool {
				self.0.is_nil()
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(RoleId, "Unique identifier for a role.");
define_id_type!(PermissionId, "Unique identifier for a permission.");

// =============================================================================
// Security Stamp
// =============================================================================

/// Opaque token bound to a user's current credentials and identity.
///
/// Anything issued against an older stamp (sessions, reset tokens) is stale
/// once the stamp changes.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityStamp(String);

impl SecurityStamp {
	/// Generate a fresh random stamp.
	pub fn generate() -> Self {
		Self(Uuid::new_v4().simple().to_string().to_uppercase())
	}

	/// Wrap a stamp loaded from storage.
	pub fn from_stored(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for SecurityStamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SecurityStamp([REDACTED])")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::HashSet;

	proptest! {
		#[test]
		fn user_id_generation_is_unique(count in 1..500usize) {
			let mut ids = HashSet::new();
			for _ in 0..count {
				prop_assert!(ids.insert(UserId::generate()), "Generated duplicate UserId");
			}
		}

		#[test]
		fn role_id_display_roundtrips_through_from_str(bytes in any::<u128>()) {
			let id = RoleId::new(Uuid::from_u128(bytes));
			let parsed: RoleId = id.to_string().parse().unwrap();
			prop_assert_eq!(parsed, id);
		}
	}

	#[test]
	fn nil_sentinel_is_detected() {
		assert!(UserId::nil().is_nil());
		assert!(!UserId::generate().is_nil());
	}

	#[test]
	fn security_stamps_differ_between_generations() {
		let a = SecurityStamp::generate();
		let b = SecurityStamp::generate();
		assert_ne!(a, b);
		assert_eq!(a.as_str().len(), 32);
	}

	#[test]
	fn security_stamp_debug_is_redacted() {
		let stamp = SecurityStamp::from_stored("SECRET");
		assert!(!format!("{stamp:?}").contains("SECRET"));
	}
}
