use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::jwt::SessionClaims;
use crate::middleware::{AUTH_COOKIE, UserContext};
use crate::models::{
    BalanceResponse, LoginRequest, LoginResponse, RegisterResponse, RegisterUser, RegisteredUser,
    User,
};
use crate::response::ApiResponse;

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies)
        .build()
}

fn issue_token(state: &AppState, user_id: i64, email: &str, is_admin: bool) -> Result<String> {
    state.signer.sign(&SessionClaims {
        user_id,
        email: email.to_string(),
        is_admin,
    })
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<RegisterUser>,
) -> Result<(StatusCode, CookieJar, Json<RegisterResponse>)> {
    input.validate()?;

    let password_hash = state
        .password_hasher
        .hash_blocking(input.password.clone())
        .await?;
    let conn = state.db.get()?;
    let user = queries::create_user(&conn, &input, &password_hash)?;
    let token = issue_token(&state, user.id, &user.email, user.is_admin)?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(&state, token.clone())),
        Json(RegisterResponse {
            success: true,
            data: RegisteredUser {
                id: user.id,
                email: user.email,
            },
            token,
            user_id: user.id,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let credentials = {
        let conn = state.db.get()?;
        queries::get_credentials_by_email(&conn, &input.email)?
    };
    let Some(credentials) = credentials else {
        // Same work factor as a real check, so unknown emails are not faster
        let _ = state.password_hasher.hash_blocking(input.password).await?;
        return Err(AppError::InvalidCredentials);
    };

    if !state
        .password_hasher
        .verify_blocking(input.password, credentials.password_hash.clone())
        .await?
    {
        tracing::debug!(user_id = credentials.id, "Login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state, credentials.id, &credentials.email, credentials.is_admin)?;

    Ok((
        jar.add(session_cookie(&state, token.clone())),
        Json(LoginResponse {
            success: true,
            message: msg::LOGGED_IN,
            user_id: credentials.id,
            token,
        }),
    ))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), Json(ApiResponse::with_message(msg::LOGGED_OUT, ())))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<ApiResponse<User>>> {
    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, ctx.user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    Ok(Json(ApiResponse::ok(user)))
}

pub async fn get_balance(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<BalanceResponse>>> {
    ctx.require_self_or_admin(user_id)?;

    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    Ok(Json(ApiResponse::ok(BalanceResponse {
        id: user.id,
        email: user.email,
        balance: user.balance,
    })))
}
