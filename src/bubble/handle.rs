// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content handles and zone classification.
//!
//! A handle is a 32-byte id written as `0x` + 64 hex characters, optionally
//! followed by `/name` for a file inside a directory. Ids whose first nibble
//! is `8` are reserved for the three shared directories:
//!
//! ```text
//! 0x8000…0001   public directory        (Zone::Public)
//! 0x8000…0002   members-only directory  (Zone::MembersOnly)
//! 0x8000…0003   admin-only directory    (Zone::AdminOnly)
//! anything else per-account file        (Zone::PerAccount)
//! ```
//!
//! Any other reserved id is rejected at parse time, so every valid handle
//! belongs to exactly one zone.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{CommunityError, CommunityResult};

/// Length of a handle id in bytes.
pub const HANDLE_LEN: usize = 32;

/// High nibble marking a reserved (directory) id.
const RESERVED_NIBBLE: u8 = 0x8;

/// Confidentiality zone of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Zone {
    Public,
    MembersOnly,
    AdminOnly,
    PerAccount,
}

impl Zone {
    pub fn classify(handle: &ContentHandle) -> Zone {
        match handle.root {
            HandleRoot::Directory(Directory::Public) => Zone::Public,
            HandleRoot::Directory(Directory::Members) => Zone::MembersOnly,
            HandleRoot::Directory(Directory::MemberAdmin) => Zone::AdminOnly,
            HandleRoot::Account(_) => Zone::PerAccount,
        }
    }
}

/// The reserved shared directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Directory {
    /// Public files such as NFT images.
    Public,
    /// Restricted to members.
    Members,
    /// Restricted to member admins.
    MemberAdmin,
}

impl Directory {
    pub const ALL: [Directory; 3] = [Directory::Public, Directory::Members, Directory::MemberAdmin];

    pub fn id(self) -> [u8; HANDLE_LEN] {
        let mut id = [0u8; HANDLE_LEN];
        id[0] = RESERVED_NIBBLE << 4;
        id[HANDLE_LEN - 1] = match self {
            Directory::Public => 1,
            Directory::Members => 2,
            Directory::MemberAdmin => 3,
        };
        id
    }

    fn from_id(id: &[u8; HANDLE_LEN]) -> Option<Directory> {
        Directory::ALL.into_iter().find(|dir| dir.id() == *id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum HandleRoot {
    Directory(Directory),
    Account([u8; HANDLE_LEN]),
}

/// Identifier of one logical file in the bubble.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHandle {
    root: HandleRoot,
    name: Option<String>,
}

impl ContentHandle {
    /// Parse `0x<64 hex>` or `0x<64 hex>/<name>`.
    pub fn parse(raw: &str) -> CommunityResult<Self> {
        let (id_part, name) = match raw.split_once('/') {
            Some((id, name)) => (id, Some(name)),
            None => (raw, None),
        };

        let hex = id_part
            .strip_prefix("0x")
            .ok_or_else(|| CommunityError::InvalidHandle(format!("{raw}: missing 0x prefix")))?;
        if hex.len() != HANDLE_LEN * 2 {
            return Err(CommunityError::InvalidHandle(format!(
                "{raw}: expected {} hex characters",
                HANDLE_LEN * 2
            )));
        }
        let bytes = alloy::hex::decode(hex)
            .map_err(|e| CommunityError::InvalidHandle(format!("{raw}: {e}")))?;
        let mut id = [0u8; HANDLE_LEN];
        id.copy_from_slice(&bytes);

        let root = if id[0] >> 4 == RESERVED_NIBBLE {
            let dir = Directory::from_id(&id).ok_or_else(|| {
                CommunityError::InvalidHandle(format!("{raw}: unknown reserved directory"))
            })?;
            HandleRoot::Directory(dir)
        } else {
            HandleRoot::Account(id)
        };

        match name {
            None => Ok(Self { root, name: None }),
            Some(name) => match root {
                HandleRoot::Directory(dir) => Self::file_in(dir, name),
                HandleRoot::Account(_) => Err(CommunityError::InvalidHandle(format!(
                    "{raw}: only directories contain named files"
                ))),
            },
        }
    }

    /// The bubble root, parent of every per-account file.
    pub fn root() -> Self {
        Self {
            root: HandleRoot::Account([0u8; HANDLE_LEN]),
            name: None,
        }
    }

    /// Per-account handle: the address left-padded with zeros.
    pub fn for_account(account: &Address) -> Self {
        let mut id = [0u8; HANDLE_LEN];
        id[HANDLE_LEN - 20..].copy_from_slice(account.as_slice());
        Self {
            root: HandleRoot::Account(id),
            name: None,
        }
    }

    pub fn directory(dir: Directory) -> Self {
        Self {
            root: HandleRoot::Directory(dir),
            name: None,
        }
    }

    /// A named file inside one of the shared directories.
    pub fn file_in(dir: Directory, name: &str) -> CommunityResult<Self> {
        if name.is_empty() || name.contains('/') {
            return Err(CommunityError::InvalidHandle(format!(
                "invalid file name {name:?}"
            )));
        }
        Ok(Self {
            root: HandleRoot::Directory(dir),
            name: Some(name.to_string()),
        })
    }

    pub fn zone(&self) -> Zone {
        Zone::classify(self)
    }

    /// Whether the id carries the reserved directory tag.
    pub fn is_reserved(&self) -> bool {
        matches!(self.root, HandleRoot::Directory(_))
    }

    /// Account owning a per-account handle, read from its trailing 20 bytes.
    pub fn account(&self) -> Option<Address> {
        match &self.root {
            HandleRoot::Account(id) => Some(Address::from_slice(&id[HANDLE_LEN - 20..])),
            HandleRoot::Directory(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Directory holding a named file.
    pub fn parent_directory(&self) -> Option<ContentHandle> {
        match (&self.root, &self.name) {
            (HandleRoot::Directory(dir), Some(_)) => Some(Self::directory(*dir)),
            _ => None,
        }
    }

    fn id(&self) -> [u8; HANDLE_LEN] {
        match &self.root {
            HandleRoot::Directory(dir) => dir.id(),
            HandleRoot::Account(id) => *id,
        }
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", alloy::hex::encode(self.id()))?;
        if let Some(name) = &self.name {
            write!(f, "/{name}")?;
        }
        Ok(())
    }
}

impl FromStr for ContentHandle {
    type Err = CommunityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentHandle {
    type Error = CommunityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHandle> for String {
    fn from(value: ContentHandle) -> Self {
        value.to_string()
    }
}

/// Lower-case `0x` form of an account, used as the directory sort key.
pub fn account_string(account: &Address) -> String {
    format!("0x{}", alloy::hex::encode(account.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PUBLIC: &str = "0x8000000000000000000000000000000000000000000000000000000000000001";
    const MEMBERS: &str = "0x8000000000000000000000000000000000000000000000000000000000000002";
    const ADMIN: &str = "0x8000000000000000000000000000000000000000000000000000000000000003";

    #[test]
    fn directory_ids_match_reserved_constants() {
        assert_eq!(ContentHandle::directory(Directory::Public).to_string(), PUBLIC);
        assert_eq!(ContentHandle::directory(Directory::Members).to_string(), MEMBERS);
        assert_eq!(ContentHandle::directory(Directory::MemberAdmin).to_string(), ADMIN);
    }

    #[test]
    fn directories_classify_to_their_zones() {
        assert_eq!(ContentHandle::parse(PUBLIC).unwrap().zone(), Zone::Public);
        assert_eq!(ContentHandle::parse(MEMBERS).unwrap().zone(), Zone::MembersOnly);
        assert_eq!(ContentHandle::parse(ADMIN).unwrap().zone(), Zone::AdminOnly);
        assert_eq!(
            ContentHandle::parse(&format!("{ADMIN}/state")).unwrap().zone(),
            Zone::AdminOnly
        );
    }

    #[test]
    fn account_handle_is_left_padded_address() {
        let account: Address = "0x00000000000000000000000000000000000000aB".parse().unwrap();
        let handle = ContentHandle::for_account(&account);
        assert_eq!(
            handle.to_string(),
            "0x00000000000000000000000000000000000000000000000000000000000000ab"
        );
        assert_eq!(handle.zone(), Zone::PerAccount);
        assert_eq!(handle.account(), Some(account));
    }

    #[test]
    fn account_is_recovered_from_trailing_bytes() {
        let raw = "0x0000000000000000000000001111111111111111111111111111111111111111";
        let handle = ContentHandle::parse(raw).unwrap();
        assert_eq!(
            account_string(&handle.account().unwrap()),
            "0x1111111111111111111111111111111111111111"
        );
    }

    #[test]
    fn unknown_reserved_id_is_rejected() {
        let raw = "0x8000000000000000000000000000000000000000000000000000000000000009";
        assert!(matches!(
            ContentHandle::parse(raw),
            Err(CommunityError::InvalidHandle(_))
        ));
    }

    #[test]
    fn malformed_handles_are_rejected() {
        assert!(ContentHandle::parse("1234").is_err());
        assert!(ContentHandle::parse("0x1234").is_err());
        assert!(ContentHandle::parse(&format!("0x{}", "zz".repeat(32))).is_err());
        assert!(ContentHandle::parse(&format!("{ADMIN}/")).is_err());
        assert!(ContentHandle::parse(&format!("{ADMIN}/a/b")).is_err());
        let account = "0x0000000000000000000000001111111111111111111111111111111111111111";
        assert!(ContentHandle::parse(&format!("{account}/name")).is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let handle = ContentHandle::file_in(Directory::MemberAdmin, "state").unwrap();
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, format!("\"{ADMIN}/state\""));
        let back: ContentHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }

    proptest! {
        #[test]
        fn every_valid_handle_has_exactly_one_zone(bytes in proptest::array::uniform32(any::<u8>())) {
            let raw = format!("0x{}", alloy::hex::encode(bytes));
            match ContentHandle::parse(&raw) {
                Ok(handle) => {
                    let zones = [Zone::Public, Zone::MembersOnly, Zone::AdminOnly, Zone::PerAccount];
                    let matches = zones.iter().filter(|z| **z == handle.zone()).count();
                    prop_assert_eq!(matches, 1);
                    prop_assert_eq!(handle.is_reserved(), handle.zone() != Zone::PerAccount);
                    prop_assert_eq!(handle.to_string(), raw);
                }
                Err(_) => {
                    // Only reserved ids outside the three directories are invalid.
                    prop_assert_eq!(bytes[0] >> 4, RESERVED_NIBBLE);
                }
            }
        }
    }
}
