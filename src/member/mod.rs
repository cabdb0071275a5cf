// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! A member's own record in the bubble.

pub mod record;
pub mod socials;
pub mod store;

pub use record::{MemberRecord, SOCIALS};
pub use socials::{extract_username, registration_hashes, unban_hashes, validate_details, validate_username};
pub use store::MemberRecordStore;
