use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use super::authenticate;
use crate::crypto::secrets_match;
use crate::db::AppState;
use crate::error::Result;

/// Who submitted a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSource {
    /// The billing system, using the shared ingest key
    IngestKey,
    /// An admin session
    Admin(i64),
}

/// Accept either `Authorization: Bearer <PAYMENT_INGEST_KEY>` or an admin session.
pub async fn payment_ingest_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    if let (Some(presented), Some(expected)) = (presented, state.payment_ingest_key.as_deref())
        && secrets_match(presented, expected)
    {
        request.extensions_mut().insert(PaymentSource::IngestKey);
        return Ok(next.run(request).await);
    }

    let ctx = authenticate(&state, request.headers())?;
    ctx.require_admin()?;
    request.extensions_mut().insert(PaymentSource::Admin(ctx.user_id));
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
