//! PKCE verifier/challenge and state nonce generation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes behind the verifier and the state nonce.
pub const RANDOM_BYTES: usize = 32;

/// Challenge method sent with the authorization request.
pub const CHALLENGE_METHOD: &str = "S256";

/// Per-attempt PKCE material. Lives only for the duration of one flow.
#[derive(Debug, Clone)]
pub struct Pkce {
    /// Random verifier, sent only with the token exchange.
    pub verifier: String,
    /// `base64url(SHA256(verifier))`, sent with the authorization request.
    pub challenge: String,
    /// Anti-forgery nonce echoed back on the callback.
    pub state: String,
}

impl Pkce {
    /// Generate a fresh verifier, challenge and state nonce.
    pub fn generate() -> Self {
        let verifier = random_base64url(RANDOM_BYTES);
        let challenge = challenge_for(&verifier);
        let state = random_base64url(RANDOM_BYTES);

        Self {
            verifier,
            challenge,
            state,
        }
    }
}

/// Base64url (no padding) encoding of `len` bytes from the OS RNG.
pub fn random_base64url(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 challenge for a verifier.
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
