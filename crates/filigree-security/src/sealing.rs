// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Secret sealing: ChaCha20-Poly1305 under a key derived from the caller's
// watermark key with PBKDF2-HMAC-SHA256 (both from `ring`).
//
// Sealed layout:
//
//   version (1) || salt (16) || nonce (12) || ciphertext || tag (16)
//
// The AEAD tag makes `open` key-sensitive: a wrong key fails authentication
// and yields `None` rather than garbage.

use std::num::NonZeroU32;

use filigree_core::error::FiligreeError;
use ring::aead::{Aad, CHACHA20_POLY1305, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, instrument};

const VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + SALT_LEN + NONCE_LEN;
const PBKDF2_ROUNDS: u32 = 10_000;
const AAD: &[u8] = b"filigree-seal";

fn derive_key(key: &str, salt: &[u8]) -> Result<LessSafeKey, FiligreeError> {
    let rounds = NonZeroU32::new(PBKDF2_ROUNDS).unwrap_or(NonZeroU32::MIN);
    let mut key_bytes = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        rounds,
        salt,
        key.as_bytes(),
        &mut key_bytes,
    );
    let unbound = UnboundKey::new(&CHACHA20_POLY1305, &key_bytes)
        .map_err(|_| FiligreeError::Sealing("cannot build AEAD key".into()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Seal `secret` under `key`. Fresh salt and nonce are drawn for every call,
/// so sealing the same secret twice yields different bytes.
#[instrument(skip_all, fields(secret_len = secret.len()))]
pub fn seal(secret: &[u8], key: &str) -> Result<Vec<u8>, FiligreeError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill(&mut salt)
        .and_then(|()| rng.fill(&mut nonce))
        .map_err(|_| FiligreeError::Sealing("system randomness unavailable".into()))?;

    let sealing_key = derive_key(key, &salt)?;
    let mut in_out = secret.to_vec();
    sealing_key
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce),
            Aad::from(AAD),
            &mut in_out,
        )
        .map_err(|_| FiligreeError::Sealing("encryption failed".into()))?;

    let mut sealed = Vec::with_capacity(HEADER_LEN + in_out.len());
    sealed.push(VERSION);
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&in_out);

    debug!(sealed_len = sealed.len(), "secret sealed");
    Ok(sealed)
}

/// Open bytes produced by [`seal`]. Returns `None` when the key is wrong,
/// the bytes were tampered with, or the layout is not recognised.
pub fn open(sealed: &[u8], key: &str) -> Option<Vec<u8>> {
    if sealed.len() < HEADER_LEN + TAG_LEN || sealed[0] != VERSION {
        return None;
    }
    let salt = &sealed[1..1 + SALT_LEN];
    let nonce: [u8; NONCE_LEN] = sealed[1 + SALT_LEN..HEADER_LEN].try_into().ok()?;

    let opening_key = derive_key(key, salt).ok()?;
    let mut in_out = sealed[HEADER_LEN..].to_vec();
    let plaintext = opening_key
        .open_in_place(Nonce::assume_unique_for_key(nonce), Aad::from(AAD), &mut in_out)
        .ok()?;
    Some(plaintext.to_vec())
}
