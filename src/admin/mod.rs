// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Member admin view of the community.
//!
//! - `directory` - incremental sync of every member record
//! - `cache` - persisted directory snapshot
//! - `poller` - background refresh loop

pub mod cache;
pub mod directory;
pub mod poller;

pub use cache::{AdminDirectoryCache, BubbleCacheStore, CacheStore, LocalCacheStore, MemberEntry};
pub use directory::{AdminDirectorySync, CacheTarget, RefreshSummary};
pub use poller::DirectoryPoller;
