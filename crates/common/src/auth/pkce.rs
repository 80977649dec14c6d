//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636. The verifier stays on the server (or with the mobile
//! client that started the flow) until token exchange; only its SHA-256
//! challenge travels through the browser.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes behind a code verifier (43 base64url characters).
pub const VERIFIER_BYTES: usize = 32;

/// Random bytes behind a `state` token (22 base64url characters).
pub const STATE_BYTES: usize = 16;

fn random_token(len: usize) -> Result<String, String> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng()
        .try_fill_bytes(&mut bytes)
        .map_err(|e| format!("secure random generation failed: {e}"))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generate a cryptographically secure code verifier
///
/// Returns a URL-safe base64-encoded random string of 32 bytes (43 characters).
/// Per RFC 7636, verifiers must be 43-128 characters long.
///
/// # Errors
/// Returns error if random number generation fails (extremely rare)
pub fn generate_code_verifier() -> Result<String, String> {
    random_token(VERIFIER_BYTES)
}

/// Generate code challenge from verifier using SHA256
///
/// Per RFC 7636, the challenge is BASE64URL(SHA256(ASCII(code_verifier)))
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state token for CSRF protection
///
/// Drawn independently from the verifier so the two can never coincide.
///
/// # Errors
/// Returns error if random number generation fails (extremely rare)
pub fn generate_state() -> Result<String, String> {
    random_token(STATE_BYTES)
}

/// Check that `challenge` was derived from `verifier` with S256.
#[must_use]
pub fn verify_code_challenge(verifier: &str, challenge: &str) -> bool {
    constant_time_eq(generate_code_challenge(verifier).as_bytes(), challenge.as_bytes())
}

/// Compare two byte strings without short-circuiting on the first mismatch.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// PKCE challenge pair plus correlating `state` for one authorization
/// request.
#[derive(Clone)]
pub struct PkceChallenge {
    /// Random string (43 chars, base64url encoded)
    /// Kept secret until token exchange
    pub code_verifier: String,

    /// SHA256 hash of code_verifier (base64url encoded)
    /// Sent in authorization request for server validation
    pub code_challenge: String,

    /// Random CSRF protection token
    /// Must match between authorization request and callback
    pub state: String,
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .field("state", &self.state)
            .finish()
    }
}

impl PkceChallenge {
    /// Generate a new PKCE challenge with cryptographically secure random
    /// values
    ///
    /// # Examples
    /// ```
    /// use moneymon_common::auth::pkce::{generate_code_challenge, PkceChallenge};
    ///
    /// let challenge = PkceChallenge::generate().expect("Failed to generate PKCE challenge");
    /// assert_eq!(challenge.code_verifier.len(), 43);
    /// assert_eq!(challenge.code_challenge, generate_code_challenge(&challenge.code_verifier));
    /// ```
    ///
    /// # Errors
    /// Returns error if cryptographic random number generation fails (extremely
    /// rare)
    pub fn generate() -> Result<Self, String> {
        let code_verifier = generate_code_verifier()?;
        let code_challenge = generate_code_challenge(&code_verifier);
        let state = generate_state()?;

        Ok(Self { code_verifier, code_challenge, state })
    }

    /// Get the challenge method (always "S256" for SHA256)
    #[must_use]
    pub const fn challenge_method(&self) -> &'static str {
        "S256"
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::pkce.
    use super::*;

    /// Validates `PkceChallenge::generate` behavior for the generate pkce
    /// challenge scenario.
    ///
    /// Assertions:
    /// - Ensures `challenge.code_verifier.len()` is within the RFC 7636
    ///   43-128 range.
    /// - Ensures `challenge.state.len() >= 22` (16 random bytes).
    /// - Ensures the state never equals the verifier.
    #[test]
    fn test_generate_pkce_challenge() {
        let challenge = PkceChallenge::generate().expect("Failed to generate challenge");

        assert!(
            (43..=128).contains(&challenge.code_verifier.len()),
            "code_verifier length out of range: {} chars",
            challenge.code_verifier.len()
        );
        assert!(challenge.state.len() >= 22);
        assert_ne!(challenge.state, challenge.code_verifier);
        assert!(!challenge.code_challenge.is_empty());
    }

    /// Validates `PkceChallenge::generate` behavior for the unique challenges
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `challenge1.code_verifier` differs from
    ///   `challenge2.code_verifier`.
    /// - Confirms `challenge1.state` differs from `challenge2.state`.
    #[test]
    fn test_unique_challenges() {
        let challenge1 = PkceChallenge::generate().expect("Failed to generate challenge 1");
        let challenge2 = PkceChallenge::generate().expect("Failed to generate challenge 2");

        assert_ne!(challenge1.code_verifier, challenge2.code_verifier);
        assert_ne!(challenge1.code_challenge, challenge2.code_challenge);
        assert_ne!(challenge1.state, challenge2.state);
    }

    /// Validates `PkceChallenge::generate` behavior for the challenge method
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `challenge.challenge_method()` equals `"S256"`.
    #[test]
    fn test_challenge_method() {
        let challenge = PkceChallenge::generate().expect("Failed to generate challenge");
        assert_eq!(challenge.challenge_method(), "S256");
    }

    /// Validates base64url alphabet and padding for every generated field.
    ///
    /// Assertions:
    /// - Ensures no field contains `=`, `+` or `/`.
    #[test]
    fn test_base64url_encoding() {
        let challenge = PkceChallenge::generate().expect("Failed to generate challenge");

        for value in [&challenge.code_verifier, &challenge.code_challenge, &challenge.state] {
            assert!(!value.contains('='), "padding found in {value}");
            assert!(!value.contains('+'), "'+' found in {value}");
            assert!(!value.contains('/'), "'/' found in {value}");
        }
    }

    /// Validates the challenge against the RFC 7636 appendix B test vector.
    ///
    /// Assertions:
    /// - Confirms the known verifier hashes to the published challenge.
    #[test]
    fn test_rfc7636_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            generate_code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    /// Validates the challenge relation over many generated pairs.
    ///
    /// Assertions:
    /// - Confirms `verify_code_challenge` holds for 100 generated pairs.
    /// - Confirms a challenge from another pair is rejected.
    #[test]
    fn test_challenge_matches_verifier_for_all_pairs() {
        let mut previous: Option<PkceChallenge> = None;
        for _ in 0..100 {
            let challenge = PkceChallenge::generate().expect("Failed to generate challenge");
            assert!(verify_code_challenge(&challenge.code_verifier, &challenge.code_challenge));
            if let Some(prev) = &previous {
                assert!(!verify_code_challenge(&challenge.code_verifier, &prev.code_challenge));
            }
            previous = Some(challenge);
        }
    }

    /// Assertions:
    /// - Confirms equal inputs compare equal.
    /// - Confirms length and content mismatches compare unequal.
    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"verifier", b"verifier"));
        assert!(!constant_time_eq(b"verifier", b"verifiex"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }

    /// Assertions:
    /// - Ensures the verifier is not printed by `Debug`.
    #[test]
    fn test_debug_redacts_verifier() {
        let challenge = PkceChallenge::generate().expect("Failed to generate challenge");
        let rendered = format!("{challenge:?}");
        assert!(!rendered.contains(&challenge.code_verifier));
    }
}
