// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Member profile details.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Socials checked at registration, in hashing order.
pub const SOCIALS: [&str; 3] = ["twitter", "discord", "telegram"];

/// Decoded contents of a member's record.
///
/// Unknown fields are kept in `extra` so a record written by a newer client
/// survives a load/save cycle unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemberRecord {
    pub fn social(&self, social: &str) -> Option<&str> {
        match social {
            "twitter" => self.twitter.as_deref(),
            "discord" => self.discord.as_deref(),
            "telegram" => self.telegram.as_deref(),
            _ => None,
        }
    }

    /// Overlay every field set in `update`.
    pub fn merge(&mut self, update: MemberRecord) {
        if update.twitter.is_some() {
            self.twitter = update.twitter;
        }
        if update.discord.is_some() {
            self.discord = update.discord;
        }
        if update.telegram.is_some() {
            self.telegram = update.telegram;
        }
        if update.name.is_some() {
            self.name = update.name;
        }
        self.extra.extend(update.extra);
    }

    pub fn is_empty(&self) -> bool {
        self.twitter.is_none()
            && self.discord.is_none()
            && self.telegram.is_none()
            && self.name.is_none()
            && self.extra.is_empty()
    }
}
