// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring for the Nucleus server binary.

pub mod seed;
pub mod services;

pub use seed::{seed, SeedError, SeedReport};
pub use services::UserServices;
