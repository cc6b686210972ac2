/// User Routes
///
/// Account creation and credential changes. Passwords are hashed here and
/// never leave the store again.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, ErrorContext};
use crate::middleware::AuthenticatedUser;
use crate::session::SessionService;
use crate::store::{NewUser, UserUpdate};
use crate::validators::is_valid_email;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let email = is_valid_email(&form.email)?;
    let hashed_password = sessions
        .hasher()
        .hash_in_background(form.password.clone())
        .await?;

    let user = sessions
        .store()
        .create_user(NewUser {
            id: Uuid::new_v4(),
            email,
            hashed_password,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(user.profile()))
}

/// PUT /api/users
///
/// **Requires a valid access token**; the caller can only change their own
/// email and password.
///
/// # Errors
/// - 400: Invalid email
/// - 401: Missing, invalid or expired access token (middleware)
/// - 409: Email taken by another account
pub async fn update_user(
    caller: web::ReqData<AuthenticatedUser>,
    form: web::Json<CredentialsRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update");
    let user_id = caller.user_id;

    let email = is_valid_email(&form.email)?;
    let hashed_password = sessions
        .hasher()
        .hash_in_background(form.password.clone())
        .await?;

    let user = sessions
        .store()
        .update_user(UserUpdate {
            id: user_id,
            email,
            hashed_password,
            updated_at: Utc::now(),
        })
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(user.profile()))
}
