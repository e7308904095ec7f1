//! OAuth authorization code + PKCE (RFC 7636) helpers.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Per-attempt PKCE material. Never reused across login attempts.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
    pub nonce: String,
}

impl PkceChallenge {
    /// Fresh verifier (32 random bytes), its S256 challenge, and random
    /// `state`/`nonce` values (16 bytes each).
    pub fn generate() -> Self {
        let verifier = random_token::<32>();
        let challenge = compute_code_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token::<16>(),
            nonce: random_token::<16>(),
        }
    }
}

/// Compute code_challenge = base64url_nopad(sha256(verifier)).
pub fn compute_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

fn random_token<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
