// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Session claims and the authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user id as a string.
    pub sub: String,
    #[serde(rename = "userId")]
    pub user_id: u64,
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated caller extracted from a verified session token.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: u64,
    pub wallet_address: String,
    pub email: String,
    /// Token expiration (Unix timestamp)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Build from verified claims.
    ///
    /// `sub` and `userId` must agree; a mismatch means the token was not
    /// minted by this server.
    pub fn from_claims(claims: SessionClaims) -> Option<Self> {
        if claims.sub.parse::<u64>().ok()? != claims.user_id {
            return None;
        }
        Some(Self {
            user_id: claims.user_id,
            wallet_address: claims.wallet_address,
            email: claims.email,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, user_id: u64) -> SessionClaims {
        SessionClaims {
            sub: sub.to_string(),
            user_id,
            wallet_address: "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".to_string(),
            email: "juan@example.com".to_string(),
            iat: 0,
            exp: 10,
        }
    }

    #[test]
    fn from_claims_requires_matching_subject() {
        let user = AuthenticatedUser::from_claims(claims("7", 7)).unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.expires_at, 10);

        assert!(AuthenticatedUser::from_claims(claims("8", 7)).is_none());
        assert!(AuthenticatedUser::from_claims(claims("abc", 7)).is_none());
    }

    #[test]
    fn claims_use_camel_case_names() {
        let json = serde_json::to_value(claims("1", 1)).unwrap();
        assert_eq!(json["userId"], 1);
        assert!(json.get("walletAddress").is_some());
    }
}
