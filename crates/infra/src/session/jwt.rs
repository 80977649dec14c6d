//! HS256 session tokens

use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use moneymon_core::auth::ports::{SessionClaims, SessionSigner};
use moneymon_domain::constants::MIN_JWT_SECRET_LEN;
use moneymon_domain::{MoneymonError, Result};

/// Signs session claims with a shared HMAC secret.
///
/// Expiry is enforced with zero leeway.
#[derive(Clone)]
pub struct JwtSessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionSigner {
    /// # Errors
    /// Returns `MoneymonError::Config` when the secret is shorter than 32
    /// bytes.
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(MoneymonError::Config(format!(
                "JWT secret must be at least {MIN_JWT_SECRET_LEN} bytes"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }
}

impl fmt::Debug for JwtSessionSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSessionSigner").field("algorithm", &Algorithm::HS256).finish()
    }
}

impl SessionSigner for JwtSessionSigner {
    fn sign(&self, claims: &SessionClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| MoneymonError::Internal(format!("failed to sign session token: {e}")))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => MoneymonError::Auth("session token expired".into()),
                _ => MoneymonError::Auth(format!("invalid session token: {e}")),
            })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session::jwt.
    use moneymon_domain::AuthProvider;

    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock after epoch")
            .as_secs() as i64
    }

    fn claims(exp: i64) -> SessionClaims {
        SessionClaims {
            user_id: "user-1".into(),
            email: "ada@example.com".into(),
            provider: AuthProvider::Google,
            iat: now(),
            exp,
        }
    }

    /// Assertions:
    /// - Confirms a signed token verifies back to the same claims.
    #[test]
    fn signed_token_verifies() {
        let signer = JwtSessionSigner::new(SECRET).expect("signer");
        let original = claims(now() + 3600);
        let token = signer.sign(&original).expect("signs");
        assert_eq!(signer.verify(&token).expect("verifies"), original);
    }

    /// Assertions:
    /// - Confirms expired tokens are rejected with zero leeway.
    /// - Confirms tokens from another secret are rejected.
    #[test]
    fn expired_or_foreign_tokens_fail() {
        let signer = JwtSessionSigner::new(SECRET).expect("signer");
        let expired = signer.sign(&claims(now() - 1)).expect("signs");
        assert!(matches!(
            signer.verify(&expired),
            Err(MoneymonError::Auth(msg)) if msg.contains("expired")
        ));

        let other = JwtSessionSigner::new(b"ffffffffffffffffffffffffffffffff").expect("signer");
        let foreign = other.sign(&claims(now() + 3600)).expect("signs");
        assert!(matches!(signer.verify(&foreign), Err(MoneymonError::Auth(_))));
    }

    /// Assertions:
    /// - Confirms short secrets are refused.
    #[test]
    fn short_secret_is_refused() {
        assert!(matches!(JwtSessionSigner::new(b"short"), Err(MoneymonError::Config(_))));
    }
}
