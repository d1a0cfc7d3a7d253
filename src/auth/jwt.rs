use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;

use super::{AccessClaims, RefreshClaims};
use crate::error::AuthError;

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

pub fn now_unix() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize
}

pub fn encode_claims<T: Serialize>(keys: &JwtKeys, claims: &T) -> Result<String, AuthError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".into());

    encode(&header, claims, &keys.enc)
        .map_err(|err| AuthError::Internal(format!("token encoding failed: {err}")))
}

/// Stateless verification of an access token: bad signature or elapsed
/// expiry both surface as `InvalidToken`.
pub fn decode_access(keys: &JwtKeys, token: &str) -> Result<AccessClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<AccessClaims>(token, &keys.dec, &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

/// Signature-only check of a refresh token. Expiry is deliberately not
/// validated here: the persisted record's `expires_at` is authoritative and
/// an expired-but-genuine token must be distinguishable from a forged one.
pub fn decode_refresh(keys: &JwtKeys, token: &str) -> Result<RefreshClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    decode::<RefreshClaims>(token, &keys.dec, &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidRefreshToken)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn access_claims(ttl: i64) -> AccessClaims {
        let iat = now_unix();
        AccessClaims {
            sub: Uuid::new_v4().to_string(),
            username: "alice".to_string(),
            roles: vec!["user".to_string()],
            iat,
            exp: (iat as i64 + ttl) as usize,
        }
    }

    #[test]
    fn access_token_round_trips_until_expiry() {
        let keys = JwtKeys::from_secret(b"unit-test-access-secret-32bytes!");
        let claims = access_claims(600);
        let token = encode_claims(&keys, &claims).expect("token should encode");

        let decoded = decode_access(&keys, &token).expect("token should verify");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn expired_access_token_is_invalid() {
        let keys = JwtKeys::from_secret(b"unit-test-access-secret-32bytes!");
        let token = encode_claims(&keys, &access_claims(-600)).unwrap();

        assert!(matches!(
            decode_access(&keys, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn access_and_refresh_secrets_are_not_interchangeable() {
        let access = JwtKeys::from_secret(b"unit-test-access-secret-32bytes!");
        let refresh = JwtKeys::from_secret(b"unit-test-refresh-secret-32bytes");

        let token = encode_claims(&access, &access_claims(600)).unwrap();
        assert!(decode_access(&refresh, &token).is_err());
    }

    #[test]
    fn refresh_decode_ignores_expiry_but_not_signature() {
        let keys = JwtKeys::from_secret(b"unit-test-refresh-secret-32bytes");
        let iat = now_unix();
        let claims = RefreshClaims {
            sub: Uuid::new_v4().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat,
            exp: iat.saturating_sub(3600), // already expired
        };
        let token = encode_claims(&keys, &claims).unwrap();

        let decoded = decode_refresh(&keys, &token).expect("signature is valid");
        assert_eq!(decoded.sub, claims.sub);

        let other = JwtKeys::from_secret(b"some-entirely-different-secret!!");
        assert!(matches!(
            decode_refresh(&other, &token),
            Err(AuthError::InvalidRefreshToken)
        ));
    }
}
