//! PKCE primitives (RFC 7636).
//!
//! The verifier is a random string from the unreserved character set; the
//! challenge is `base64url(SHA-256(verifier))` without padding. Only the
//! challenge travels to the authorization endpoint.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Unreserved characters allowed in a code verifier (RFC 7636 §4.1).
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Verifier length. RFC 7636 allows 43..=128; use the maximum.
const VERIFIER_LEN: usize = 128;

/// Length of the CSRF `state` value.
const STATE_LEN: usize = 32;

fn random_from_charset(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| VERIFIER_CHARSET[rng.gen_range(0..VERIFIER_CHARSET.len())] as char)
        .collect()
}

/// Generate a random CSRF state token.
pub fn generate_state() -> String {
    random_from_charset(STATE_LEN)
}

/// Generate a high-entropy code verifier.
pub fn generate_code_verifier() -> String {
    random_from_charset(VERIFIER_LEN)
}

/// Derive the S256 code challenge for a verifier.
pub fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Build the authorization redirect URL.
pub fn authorization_url(
    auth_base_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    challenge: &str,
) -> String {
    format!(
        "{}/auth/v1/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&state={}&code_challenge={}&code_challenge_method=S256",
        auth_base_url.trim_end_matches('/'),
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(state),
        urlencoding::encode(challenge),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_matches_rfc7636_test_vector() {
        // RFC 7636 appendix B.
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn challenge_is_deterministic() {
        let verifier = generate_code_verifier();
        assert_eq!(code_challenge(&verifier), code_challenge(&verifier));
    }

    #[test]
    fn verifier_uses_unreserved_charset_and_legal_length() {
        let verifier = generate_code_verifier();
        assert!(verifier.len() >= 43 && verifier.len() <= 128);
        assert!(verifier.bytes().all(|b| VERIFIER_CHARSET.contains(&b)));
    }

    #[test]
    fn state_values_differ_between_attempts() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn authorization_url_carries_pkce_parameters() {
        let url = authorization_url(
            "https://auth.example.com",
            "client-1",
            "http://localhost:3000/api/auth/callback",
            "S1",
            "challenge123",
        );
        assert!(url.starts_with("https://auth.example.com/auth/v1/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=S1"));
        assert!(url.contains("code_challenge=challenge123"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback"));
    }
}
