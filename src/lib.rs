// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bubble Community - Membership Core
//!
//! Community membership records live in a shared, access-controlled bubble.
//! Each member owns one encrypted record that only they and the member
//! admins can read; admins keep an incrementally synced directory of every
//! record.
//!
//! ## Modules
//!
//! - `session` - login/logout lifecycle and community actions
//! - `crypto` - login key derivation, ECDH and AES-256-GCM
//! - `bubble` - content handles, encryption policy dispatch, content stores
//! - `member` - a member's own record and social username helpers
//! - `admin` - member admin directory sync
//! - `blockchain` - community contract and wallet seams
//! - `storage` - local key-value persistence (redb)
//! - `events` - state notifications for observers

pub mod admin;
pub mod blockchain;
pub mod bubble;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod member;
pub mod session;
pub mod storage;

pub use error::{CommunityError, CommunityResult};
pub use session::{Session, SessionDeps};
