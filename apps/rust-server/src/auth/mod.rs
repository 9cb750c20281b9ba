// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! # Authentication Module
//!
//! Session tokens for the TULDOK Social API.
//!
//! ## Auth Flow
//!
//! 1. A verified user logs in with `POST /api/login` and their wallet address
//! 2. The server issues an HS256 JWT (7 days) signed with `JWT_SECRET`
//! 3. The client sends `Authorization: Bearer <token>` on protected routes
//! 4. The [`Auth`] extractor verifies signature and expiry and yields:
//!    - `sub` → numeric user id
//!    - wallet address and email captured at login
//!
//! ## Notes
//!
//! - Login does not check a wallet signature; possession of a verified
//!   wallet address is enough to obtain a session
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod session;

pub use claims::{AuthenticatedUser, SessionClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use session::{SessionKeys, SESSION_TTL};
