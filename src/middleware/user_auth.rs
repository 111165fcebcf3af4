use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use super::AUTH_COOKIE;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: i64,
    pub email: String,
    pub is_admin: bool,
}

impl UserContext {
    /// Allow access to `user_id`'s resources: the user themselves or an admin.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<()> {
        if self.user_id == user_id || self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(msg::NOT_YOUR_ACCOUNT.into()))
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(msg::ADMIN_REQUIRED.into()))
        }
    }
}

/// Bearer token from the Authorization header, falling back to the cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Verify the session token and load the caller.
///
/// Admin rights come from the database, not the token, so a demotion takes
/// effect immediately.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserContext> {
    let token = session_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = state.signer.verify(&token)?;

    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, claims.user_id)?.ok_or(AppError::Unauthorized)?;

    Ok(UserContext {
        user_id: user.id,
        email: user.email,
        is_admin: user.is_admin,
    })
}

pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let ctx = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let ctx = authenticate(&state, request.headers())?;
    ctx.require_admin()?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
