// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM sealing used by every encrypted zone.
//!
//! Sealed output layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! A fresh random nonce is drawn for every seal.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

/// Key length for AES-256-GCM.
pub const KEY_LEN: usize = 32;

const TAG_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum AeadError {
    #[error("AEAD key rejected")]
    KeyRejected,

    #[error("system random source failed")]
    Random,

    #[error("sealed data is too short ({0} bytes)")]
    Truncated(usize),

    #[error("authentication failed")]
    Authentication,

    #[error("invalid key encoding: {0}")]
    Encoding(String),
}

/// Symmetric AEAD key.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a random key from the system RNG.
    pub fn generate() -> Result<Self, AeadError> {
        let mut bytes = [0u8; KEY_LEN];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| AeadError::Random)?;
        Ok(Self(bytes))
    }

    /// Decode from hex, with or without a `0x` prefix.
    pub fn from_hex(hex: &str) -> Result<Self, AeadError> {
        let raw = alloy::hex::decode(hex.trim_start_matches("0x"))
            .map_err(|e| AeadError::Encoding(e.to_string()))?;
        let bytes: [u8; KEY_LEN] = raw
            .try_into()
            .map_err(|v: Vec<u8>| AeadError::Encoding(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self(bytes))
    }

    /// Lower-case hex without prefix.
    pub fn to_hex(&self) -> String {
        alloy::hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn less_safe_key(&self) -> Result<LessSafeKey, AeadError> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.0).map_err(|_| AeadError::KeyRejected)?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt and authenticate `plaintext`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, AeadError> {
        let key = self.less_safe_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| AeadError::Random)?;

        let mut in_out = plaintext.to_vec();
        key.seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| AeadError::Authentication)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(sealed)
    }

    /// Verify and decrypt data produced by [`SymmetricKey::seal`].
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, AeadError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(AeadError::Truncated(sealed.len()));
        }
        let key = self.less_safe_key()?;
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| AeadError::Truncated(sealed.len()))?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| AeadError::Authentication)?;
        Ok(plaintext.to_vec())
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}
