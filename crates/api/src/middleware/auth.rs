//! JWT-based identity extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use surveyor_core::error::CoreError;
use surveyor_core::params::Respondent;
use surveyor_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying an anonymous respondent's session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's organization, if the token names one.
    pub organization_id: Option<DbId>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        bearer_user(parts, state)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })
    }
}

/// Whoever is submitting: an authenticated user, an anonymous session, or
/// neither. Whether identity was required is decided by response validation
/// (public surveys accept anonymous responses).
///
/// A present but invalid token is still rejected with 401.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub user: Option<AuthUser>,
    pub session_token: Option<String>,
}

impl Identity {
    pub fn respondent(&self) -> Respondent {
        Respondent {
            user_id: self.user.as_ref().map(|u| u.user_id),
            organization_id: self.user.as_ref().and_then(|u| u.organization_id),
            session_token: self.session_token.clone(),
        }
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = bearer_user(parts, state)?;
        let session_token = parts
            .headers
            .get(SESSION_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Identity {
            user,
            session_token,
        })
    }
}

/// `Ok(None)` when no `Authorization` header is sent.
fn bearer_user(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let Some(header) = parts.headers.get("authorization") else {
        return Ok(None);
    };
    let header = header.to_str().map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid Authorization header".into()))
    })?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })?;

    let claims = validate_token(token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    Ok(Some(AuthUser {
        user_id: claims.sub,
        organization_id: claims.organization_id,
    }))
}
