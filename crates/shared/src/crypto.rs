//! Cryptographic utilities for invitation token generation and hashing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes in an invitation token (256 bits).
pub const INVITATION_TOKEN_BYTES: usize = 32;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates an unguessable, URL-safe invitation token.
///
/// The token is 32 bytes from the OS RNG encoded as unpadded base64url
/// (43 characters), so it can be embedded in a query string as-is.
pub fn generate_invitation_token() -> String {
    let mut bytes = [0u8; INVITATION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest under which an invitation token is stored and looked up.
///
/// Only the digest is persisted; the plain token leaves the system once,
/// inside the invitation URL.
pub fn hash_invitation_token(token: &str) -> String {
    sha256_hex(token.trim())
}
