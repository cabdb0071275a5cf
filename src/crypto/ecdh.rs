// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! secp256k1 Diffie-Hellman between two keypairs.
//!
//! The shared secret is `sha256(compressed(own_secret * counterparty_public))`,
//! the same derivation libsecp256k1 uses by default, so either side of the
//! pair arrives at the same 32 bytes.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use sha2::{Digest, Sha256};

use super::SymmetricKey;

/// Derive the shared secret for `(own_secret, counterparty_public)`.
pub fn shared_secret(own_secret: &SecretKey, counterparty_public: &PublicKey) -> [u8; 32] {
    let point = (counterparty_public.to_projective() * *own_secret.to_nonzero_scalar()).to_affine();
    let compressed = point.to_encoded_point(true);
    Sha256::digest(compressed.as_bytes()).into()
}

/// Shared secret wrapped as an AEAD key.
pub fn shared_key(own_secret: &SecretKey, counterparty_public: &PublicKey) -> SymmetricKey {
    SymmetricKey::from_bytes(shared_secret(own_secret, counterparty_public))
}
