use actix_web::{web, HttpResponse};

use crate::configuration::Platform;
use crate::error::AppError;
use crate::session::SessionService;

/// POST /admin/reset
///
/// Deletes every user and their refresh tokens. Only available on `dev`.
pub async fn reset(
    platform: web::Data<Platform>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    if *platform.get_ref() != Platform::Dev {
        return Err(AppError::Forbidden(
            "reset is only available on the dev platform".to_string(),
        ));
    }

    let deleted = sessions.store().delete_users().await?;
    tracing::warn!(deleted_users = deleted, "All users deleted");

    Ok(HttpResponse::Ok().content_type("text/plain; charset=utf-8").body("OK"))
}
