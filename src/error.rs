// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crate-wide error type.
//!
//! Every fallible operation in the membership core returns
//! [`CommunityResult`]. Variants carry a stable machine-readable code
//! (see [`CommunityError::error_code`]) so observers can react without
//! parsing messages.

use serde::Serialize;

use crate::storage::LocalStoreError;

/// Errors raised by the membership core.
#[derive(Debug, thiserror::Error)]
pub enum CommunityError {
    /// The wallet signature could not be turned into a login key.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Key material (hex, PEM or SEC1 public key) could not be decoded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// An envelope or directory file could not be decrypted.
    #[error("decryption failure: {0}")]
    DecryptionFailure(String),

    /// The admin's keyring file is missing from the bubble.
    #[error(
        "Your administrator user file is missing from the bubble. Send the following code to the community administrator: \"{public_key}\""
    )]
    MissingAdminUserFile { public_key: String },

    /// The caller lacks the key or role required for the operation.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Attempt to encrypt into another member's record from the admin side.
    #[error("member data file is read only for member admins: {0}")]
    ReadOnlyRecord(String),

    /// Failure reported by the remote content store.
    #[error("content store failure: {0}")]
    RemoteStoreFailure(String),

    /// Failure reported by the membership ledger or wallet.
    #[error("ledger call failed: {0}")]
    LedgerCallFailure(String),

    /// A content handle string is malformed or uses an unknown reserved tag.
    #[error("invalid content handle: {0}")]
    InvalidHandle(String),

    /// An account address string is malformed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Registration or profile details failed validation.
    #[error("invalid member details: {0}")]
    InvalidDetails(String),

    /// Operation requires a logged-in session.
    #[error("session is not logged in")]
    NotLoggedIn,

    /// Local key-value persistence failed.
    #[error("local store error: {0}")]
    LocalStore(#[from] LocalStoreError),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type CommunityResult<T> = Result<T, CommunityError>;

impl CommunityError {
    /// Stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            CommunityError::InvalidSignature(_) => "invalid-signature",
            CommunityError::InvalidKey(_) => "invalid-key",
            CommunityError::DecryptionFailure(_) => "decryption-failure",
            CommunityError::MissingAdminUserFile { .. } => "missing-admin-file",
            CommunityError::NotAuthorized(_) => "not-authorized",
            CommunityError::ReadOnlyRecord(_) => "read-only-record",
            CommunityError::RemoteStoreFailure(_) => "remote-store-failure",
            CommunityError::LedgerCallFailure(_) => "ledger-call-failure",
            CommunityError::InvalidHandle(_) => "invalid-handle",
            CommunityError::InvalidAddress(_) => "invalid-address",
            CommunityError::InvalidDetails(_) => "invalid-details",
            CommunityError::NotLoggedIn => "not-logged-in",
            CommunityError::LocalStore(_) => "local-store",
            CommunityError::Serialization(_) => "serialization",
        }
    }

    /// Snapshot of this error suitable for publishing to observers.
    pub fn to_event(&self) -> ErrorEvent {
        let public_key = match self {
            CommunityError::MissingAdminUserFile { public_key } => Some(public_key.clone()),
            _ => None,
        };
        ErrorEvent {
            code: self.error_code().to_string(),
            message: self.to_string(),
            public_key,
        }
    }
}

/// Published form of the last error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub code: String,
    pub message: String,
    /// Present for `missing-admin-file` so the admin can request enrolment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}
