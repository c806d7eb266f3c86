//! Session token issuance and verification (HS256 JWT).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::SessionClaims;
use crate::error::AuthError;

/// Fixed session lifetime.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Encode/decode pair bound to the service signing secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign the claims into an opaque bearer token.
    pub fn issue(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(format!("token encode: {e}")))
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use gatehouse_core::{OrgId, RoleId, UserId};

    use super::*;
    use crate::claims::{ClaimRole, SessionClaims};

    fn claims_for(now: chrono::DateTime<Utc>) -> SessionClaims {
        SessionClaims::new(
            UserId::new(),
            "alice".to_string(),
            vec![ClaimRole { id: RoleId::new(), name: "admin".to_string() }],
            OrgId::new(),
            now,
        )
    }

    #[test]
    fn issued_token_round_trips() {
        let codec = TokenCodec::new(b"test-secret");
        let claims = claims_for(Utc::now());

        let token = codec.issue(&claims).unwrap();
        let decoded = codec.verify(&token).unwrap();

        assert_eq!(decoded, claims);
        assert_eq!(decoded.exp - decoded.iat, SESSION_TTL_HOURS * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = TokenCodec::new(b"test-secret");
        let claims = claims_for(Utc::now() - Duration::hours(SESSION_TTL_HOURS + 1));

        let token = codec.issue(&claims).unwrap();
        assert_eq!(codec.verify(&token).unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let codec = TokenCodec::new(b"test-secret");
        let other = TokenCodec::new(b"other-secret");

        let token = other.issue(&claims_for(Utc::now())).unwrap();
        assert!(matches!(codec.verify(&token), Err(AuthError::TokenInvalid(_))));
    }
}
