//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid JWT Bearer token.
//! - [`auth::Identity`] -- Optional identity plus session token for anonymous respondents.

pub mod auth;
