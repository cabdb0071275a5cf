// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cryptographic building blocks.
//!
//! - `login_key` - signature-derived secp256k1 login keys
//! - `ecdh` - pairwise shared secrets between two keypairs
//! - `aead` - AES-256-GCM sealing

pub mod aead;
pub mod ecdh;
pub mod login_key;

pub use aead::{AeadError, SymmetricKey};
pub use ecdh::{shared_key, shared_secret};
pub use login_key::{parse_public_key, public_key_to_hex, LoginKey};
