// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # State Notifications
//!
//! Observers (a UI, the CLI) follow the membership core through an
//! [`EventBus`] of `tokio::sync::watch` channels. Each channel always holds
//! the latest value, so a late subscriber sees current state immediately.
//!
//! | Channel | Value |
//! |---------|-------|
//! | session state | [`SessionState`], sent only on change |
//! | membership | [`MembershipStatus`] flags from the ledger |
//! | member data | the logged-in member's record |
//! | all members | the admin's decoded member directory |
//! | community stats | [`CommunityStats`] |
//! | error | last [`ErrorEvent`] |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::admin::MemberEntry;
use crate::error::{CommunityError, ErrorEvent};
use crate::member::MemberRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    #[default]
    Open,
    LoggedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipStatus {
    pub is_member: bool,
    pub is_banned: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub member_count: u64,
}

struct Channels {
    session_state: watch::Sender<SessionState>,
    membership: watch::Sender<MembershipStatus>,
    member_data: watch::Sender<Option<MemberRecord>>,
    all_members: watch::Sender<Vec<MemberEntry>>,
    community_stats: watch::Sender<CommunityStats>,
    error: watch::Sender<Option<ErrorEvent>>,
}

/// Cloneable handle to the notification channels.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Channels {
                session_state: watch::Sender::new(SessionState::Open),
                membership: watch::Sender::new(MembershipStatus::default()),
                member_data: watch::Sender::new(None),
                all_members: watch::Sender::new(Vec::new()),
                community_stats: watch::Sender::new(CommunityStats::default()),
                error: watch::Sender::new(None),
            }),
        }
    }

    /// Publish a session state; observers are woken only when it changes.
    pub fn publish_session_state(&self, state: SessionState) {
        let changed = self.channels.session_state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            tracing::debug!(state = ?state, "Session state changed");
        }
    }

    pub fn publish_membership(&self, status: MembershipStatus) {
        self.channels.membership.send_replace(status);
    }

    pub fn publish_member_data(&self, record: Option<MemberRecord>) {
        self.channels.member_data.send_replace(record);
    }

    /// Publish the admin member list. Always notifies, even if unchanged.
    pub fn publish_members(&self, members: Vec<MemberEntry>) {
        self.channels.all_members.send_replace(members);
    }

    pub fn publish_stats(&self, stats: CommunityStats) {
        self.channels.community_stats.send_replace(stats);
    }

    pub fn publish_error(&self, error: &CommunityError) {
        tracing::warn!(code = error.error_code(), error = %error, "Publishing error");
        self.channels.error.send_replace(Some(error.to_event()));
    }

    pub fn clear_error(&self) {
        self.channels.error.send_if_modified(|current| current.take().is_some());
    }

    pub fn session_state(&self) -> SessionState {
        *self.channels.session_state.borrow()
    }

    pub fn membership(&self) -> MembershipStatus {
        *self.channels.membership.borrow()
    }

    pub fn member_data(&self) -> Option<MemberRecord> {
        self.channels.member_data.borrow().clone()
    }

    pub fn members(&self) -> Vec<MemberEntry> {
        self.channels.all_members.borrow().clone()
    }

    pub fn stats(&self) -> CommunityStats {
        *self.channels.community_stats.borrow()
    }

    pub fn last_error(&self) -> Option<ErrorEvent> {
        self.channels.error.borrow().clone()
    }

    pub fn subscribe_session_state(&self) -> watch::Receiver<SessionState> {
        self.channels.session_state.subscribe()
    }

    pub fn subscribe_membership(&self) -> watch::Receiver<MembershipStatus> {
        self.channels.membership.subscribe()
    }

    pub fn subscribe_member_data(&self) -> watch::Receiver<Option<MemberRecord>> {
        self.channels.member_data.subscribe()
    }

    pub fn subscribe_members(&self) -> watch::Receiver<Vec<MemberEntry>> {
        self.channels.all_members.subscribe()
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<CommunityStats> {
        self.channels.community_stats.subscribe()
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<Option<ErrorEvent>> {
        self.channels.error.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_notifies_only_on_change() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_session_state();

        bus.publish_session_state(SessionState::Open);
        assert!(!rx.has_changed().unwrap());

        bus.publish_session_state(SessionState::LoggedIn);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::LoggedIn);
    }

    #[test]
    fn member_list_notifies_even_when_equal() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_members();
        rx.borrow_and_update();

        bus.publish_members(Vec::new());
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn errors_carry_code_and_clear() {
        let bus = EventBus::new();
        bus.publish_error(&CommunityError::MissingAdminUserFile {
            public_key: "0x02ff".into(),
        });
        let event = bus.last_error().unwrap();
        assert_eq!(event.code, "missing-admin-file");
        assert_eq!(event.public_key.as_deref(), Some("0x02ff"));

        bus.clear_error();
        assert!(bus.last_error().is_none());
    }

    #[test]
    fn session_state_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&SessionState::LoggedIn).unwrap(),
            "\"logged-in\""
        );
    }
}
