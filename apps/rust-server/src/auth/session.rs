// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! HS256 session token issuance and verification.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{AuthError, AuthenticatedUser, SessionClaims};
use crate::storage::StoredUser;

/// Lifetime of a session token.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Signing and verification keys derived from `JWT_SECRET`.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a session token for `user`.
    pub fn issue(&self, user: &StoredUser) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            user_id: user.id,
            wallet_address: user.wallet_address.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now + SESSION_TTL.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Verify signature and expiry, returning the caller.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        let data = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        AuthenticatedUser::from_claims(data.claims).ok_or(AuthError::MalformedToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> StoredUser {
        let now = Utc::now();
        StoredUser {
            id: 42,
            wallet_address: "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".to_string(),
            email: "juan@example.com".to_string(),
            phone: "+63 912 345 6789".to_string(),
            name: "Juan".to_string(),
            balance_xrp: 0.0,
            balance_tuldok: 0.0,
            has_trust_line: false,
            verified: true,
            verification_token_hash: None,
            verification_tx_hash: None,
            email_confirmed_at: None,
            verified_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let keys = SessionKeys::new("secret");
        let token = keys.issue(&user()).unwrap();

        let caller = keys.verify(&token).unwrap();
        assert_eq!(caller.user_id, 42);
        assert_eq!(caller.wallet_address, "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh");
        assert_eq!(caller.email, "juan@example.com");

        let ttl = caller.expires_at - Utc::now().timestamp();
        assert!(ttl > SESSION_TTL.as_secs() as i64 - 60);
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = SessionKeys::new("secret").issue(&user()).unwrap();
        assert!(matches!(
            SessionKeys::new("other").verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = SessionKeys::new("secret");
        let past = Utc::now().timestamp() - 3600;
        let claims = SessionClaims {
            sub: "1".to_string(),
            user_id: 1,
            wallet_address: "r".to_string(),
            email: "e".to_string(),
            iat: past - 10,
            exp: past,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(keys.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = SessionKeys::new("secret");
        assert!(matches!(keys.verify("not-a-jwt"), Err(AuthError::MalformedToken)));
    }
}
