//! Authentication handlers.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use notepad_core::services::Registration;
use notepad_shared::dto::{LoginRequest, RegisterRequest};

use super::convert::{auth_response, user_response};
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let session = state
        .auth
        .register(Registration {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(HttpResponse::Created().json(auth_response(&session, Utc::now())))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let now = Utc::now();

    let session = state.auth.login(&req.login, &req.password, now).await?;

    Ok(HttpResponse::Ok().json(auth_response(&session, now)))
}

/// GET /api/auth/me - Protected route
pub async fn me(CurrentUser(user): CurrentUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(user_response(&user, Utc::now())))
}
