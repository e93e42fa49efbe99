//! services/api/src/adapters/jwt.rs
//!
//! This module contains the session token adapter. It implements the
//! `TokenService` port from the `core` crate with HMAC-signed JWTs.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use life_lessons_core::domain::SessionClaims;
use life_lessons_core::ports::{TokenError, TokenService};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::SigningSecret;

/// The HMAC algorithms a token may be signed with. Tokens are issued with the
/// first one.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `TokenService` port using `jsonwebtoken`.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtTokenService {
    /// Creates a new `JwtTokenService` signing with `secret`. Issued tokens
    /// expire `ttl` after issuance.
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(HMAC_ALGORITHMS[0]);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }

    fn classify(&self, token: &str, kind: &ErrorKind) -> TokenError {
        match kind {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            // An expired token reports as expired whatever its signature.
            ErrorKind::InvalidSignature if self.is_expired_unverified(token) => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => TokenError::UnsupportedAlgorithm,
            _ => TokenError::Malformed,
        }
    }

    /// Reads `alg` straight from the first segment. `jsonwebtoken` cannot
    /// represent values such as `none` and reports them as malformed.
    fn declares_foreign_algorithm(token: &str) -> bool {
        let declared = token
            .split('.')
            .next()
            .and_then(|segment| URL_SAFE_NO_PAD.decode(segment).ok())
            .and_then(|bytes| serde_json::from_slice::<RawHeader>(&bytes).ok())
            .and_then(|header| header.alg);

        match declared {
            Some(alg) => !matches!(alg.parse::<Algorithm>(), Ok(a) if HMAC_ALGORITHMS.contains(&a)),
            None => false,
        }
    }

    fn is_expired_unverified(&self, token: &str) -> bool {
        let mut validation = Self::validation();
        validation.insecure_disable_signature_validation();
        matches!(
            decode::<ClaimsRecord>(token, &self.decoding_key, &validation),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature)
        )
    }
}

//=========================================================================================
// Wire Claims
//=========================================================================================

#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
}

/// The claims exactly as they travel inside the token.
#[derive(Debug, Serialize, Deserialize)]
struct ClaimsRecord {
    admin: bool,
    email: String,
    /// The stored password hash, never the plaintext.
    password: String,
    exp: i64,
    /// Distinguishes tokens minted for the same account within one second.
    #[serde(default)]
    jti: String,
}

impl ClaimsRecord {
    fn to_domain(self) -> Result<SessionClaims, TokenError> {
        let expires_at = Utc
            .timestamp_opt(self.exp, 0)
            .single()
            .ok_or(TokenError::Malformed)?;
        Ok(SessionClaims {
            email: self.email,
            password_hash: self.password,
            is_admin: self.admin,
            expires_at,
        })
    }
}

//=========================================================================================
// `TokenService` Trait Implementation
//=========================================================================================

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        account_id: Uuid,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<String, TokenError> {
        let claims = ClaimsRecord {
            admin: is_admin,
            email: email.to_string(),
            password: password_hash.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(HMAC_ALGORITHMS[0]), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        debug!(account_id = %account_id, exp = claims.exp, "Signed session token");
        Ok(token)
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        if Self::declares_foreign_algorithm(token) {
            return Err(TokenError::UnsupportedAlgorithm);
        }
        match decode::<ClaimsRecord>(token, &self.decoding_key, &Self::validation()) {
            Ok(data) => data.claims.to_domain(),
            Err(e) => Err(self.classify(token, e.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, ttl: Duration) -> JwtTokenService {
        JwtTokenService::new(&SigningSecret::new(secret), ttl)
    }

    fn issue_default(tokens: &JwtTokenService) -> String {
        tokens
            .issue(Uuid::new_v4(), "a@x.com", "$argon2id$hash", true)
            .unwrap()
    }

    #[test]
    fn verify_recovers_issued_claims() {
        let tokens = service("secret", Duration::hours(24));
        let token = issue_default(&tokens);

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.password_hash, "$argon2id$hash");
        assert!(claims.is_admin);

        let ahead = claims.expires_at - Utc::now();
        assert!(ahead > Duration::hours(24) - Duration::seconds(5));
        assert!(ahead <= Duration::hours(24));
    }

    #[test]
    fn expired_token_is_expired_not_malformed() {
        let tokens = service("secret", Duration::hours(-1));
        let token = issue_default(&tokens);
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn expired_token_is_expired_even_with_foreign_signature() {
        let foreign = service("other-secret", Duration::hours(-1));
        let token = issue_default(&foreign);
        let tokens = service("secret", Duration::hours(24));
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_secret_is_an_invalid_signature() {
        let foreign = service("other-secret", Duration::hours(24));
        let token = issue_default(&foreign);
        let tokens = service("secret", Duration::hours(24));
        assert_eq!(tokens.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn accepts_other_hmac_variants() {
        let tokens = service("secret", Duration::hours(24));
        let claims = ClaimsRecord {
            admin: false,
            email: "b@x.com".to_string(),
            password: "hash".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            jti: String::new(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert_eq!(tokens.verify(&token).unwrap().email, "b@x.com");
    }

    #[test]
    fn non_hmac_algorithm_is_unsupported() {
        let tokens = service("secret", Duration::hours(24));
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            format!(
                r#"{{"admin":true,"email":"a@x.com","password":"h","exp":{}}}"#,
                (Utc::now() + Duration::hours(1)).timestamp()
            )
            .as_bytes(),
        );
        let token = format!("{header}.{payload}.c2lnbmF0dXJl");

        assert_eq!(tokens.verify(&token), Err(TokenError::UnsupportedAlgorithm));
    }

    #[test]
    fn unsigned_token_is_unsupported() {
        let tokens = service("secret", Duration::hours(24));
        let payload = URL_SAFE_NO_PAD.encode(
            format!(
                r#"{{"admin":true,"email":"a@x.com","password":"h","exp":{}}}"#,
                (Utc::now() + Duration::hours(1)).timestamp()
            )
            .as_bytes(),
        );

        for alg in ["none", "None", "hs256"] {
            let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#));
            let token = format!("{header}.{payload}.");
            assert_eq!(
                tokens.verify(&token),
                Err(TokenError::UnsupportedAlgorithm),
                "alg {alg} should be unsupported"
            );
        }
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service("secret", Duration::hours(24));
        assert_eq!(tokens.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn back_to_back_tokens_differ() {
        let tokens = service("secret", Duration::hours(24));
        assert_ne!(issue_default(&tokens), issue_default(&tokens));
    }
}
