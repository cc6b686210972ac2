use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::get_api_key;
use crate::configuration::PolkaSettings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::session::SessionService;

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct WebhookData {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

/// POST /api/polka/webhooks
///
/// Called by the payment provider with `Authorization: ApiKey <key>`.
/// Only `user.upgraded` does anything; other events are acknowledged.
pub async fn polka_webhook(
    req: HttpRequest,
    payload: web::Json<WebhookEvent>,
    polka: web::Data<PolkaSettings>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let key = get_api_key(req.headers())?;
    match polka.api_key.as_deref() {
        Some(expected) if expected == key => {}
        _ => return Err(AuthError::ApiKeyRejected.into()),
    }

    if payload.event != USER_UPGRADED {
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = Uuid::parse_str(&payload.data.user_id)
        .map_err(|_| ValidationError::InvalidFormat("user_id".to_string()))?;

    sessions.store().upgrade_user(user_id, Utc::now()).await?;
    tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");

    Ok(HttpResponse::NoContent().finish())
}
