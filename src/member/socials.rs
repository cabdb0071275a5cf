// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Social usernames: parsing, validation and ledger hashes.
//!
//! The ledger never sees a username. It stores
//! `keccak256("{salt}:{social}:{lowercase username}")` so a banned social
//! can block re-registration under a new account.

use alloy::primitives::{keccak256, B256};

use super::record::{MemberRecord, SOCIALS};
use crate::error::{CommunityError, CommunityResult};

/// Profile URL host for socials entered as links.
pub const TWITTER_HOST: &str = "https://twitter.com";

/// Zero-hash slots appended after the three social hashes at registration.
const RESERVED_SOCIAL_SLOTS: usize = 2;

/// Pull a bare username out of user input.
///
/// With a `host`, `text` may be a profile URL or a path relative to it, and
/// must resolve to exactly one path segment. Without one, the trimmed text is
/// the username. A single leading `@` or `#` is dropped in both cases.
pub fn extract_username(text: &str, host: Option<&str>) -> Option<String> {
    let candidate = match host {
        Some(host) => {
            let url = url::Url::parse(host).and_then(|base| base.join(text)).ok()?;
            let parts: Vec<&str> = url.path().split('/').collect();
            if parts.len() != 2 {
                return None;
            }
            parts[1].to_string()
        }
        None => text.trim().to_string(),
    };

    let username = candidate
        .strip_prefix(['@', '#'])
        .map(str::to_string)
        .unwrap_or(candidate);
    (!username.is_empty()).then_some(username)
}

pub fn validate_username(text: &str, host: Option<&str>) -> bool {
    extract_username(text, host).is_some()
}

/// Check the three socials the registration form collects.
pub fn validate_details(details: &MemberRecord) -> CommunityResult<()> {
    for social in SOCIALS {
        let host = (social == "twitter").then_some(TWITTER_HOST);
        let value = details.social(social).unwrap_or_default();
        if !validate_username(value, host) {
            return Err(CommunityError::InvalidDetails(format!(
                "invalid {social} username"
            )));
        }
    }
    Ok(())
}

/// Ledger hash of one social username.
pub fn social_hash(salt: &str, social: &str, username: &str) -> B256 {
    keccak256(format!("{salt}:{social}:{}", username.to_lowercase()))
}

/// Non-empty socials after trimming, in hashing order.
fn trimmed_socials(details: &MemberRecord) -> Vec<(&'static str, &str)> {
    SOCIALS
        .into_iter()
        .filter_map(|social| {
            let value = details.social(social)?.trim();
            (!value.is_empty()).then_some((social, value))
        })
        .collect()
}

/// Hashes passed to `registerAsMember`. Every social is required.
pub fn registration_hashes(salt: &str, details: &MemberRecord) -> CommunityResult<Vec<B256>> {
    let present = trimmed_socials(details);
    for social in SOCIALS {
        if !present.iter().any(|(name, _)| *name == social) {
            return Err(CommunityError::InvalidDetails(format!(
                "missing {social} username"
            )));
        }
    }

    let mut hashes: Vec<B256> = present
        .into_iter()
        .map(|(social, value)| social_hash(salt, social, value))
        .collect();
    hashes.extend([B256::ZERO; RESERVED_SOCIAL_SLOTS]);
    Ok(hashes)
}

/// Hashes passed to `unbanSocials`: only the socials that are set.
pub fn unban_hashes(salt: &str, details: &MemberRecord) -> Vec<B256> {
    trimmed_socials(details)
        .into_iter()
        .map(|(social, value)| social_hash(salt, social, value))
        .collect()
}
