//! User management handlers. Every route here requires an administrator.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use notepad_core::PageRequest;
use notepad_core::ports::UserFilter;
use notepad_shared::ApiResponse;
use notepad_shared::dto::{BlockUserRequest, ListQuery};

use super::convert::{paged, user_response};
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Longest block that can be expressed in hours: ten years.
const MAX_BLOCK_HOURS: i64 = 24 * 365 * 10;

/// GET /api/users?page=&page_size=&search=
pub async fn list(
    state: web::Data<AppState>,
    CurrentUser(admin): CurrentUser,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = UserFilter {
        search: query.search,
    };

    let page = state
        .moderation
        .list_users(&admin, &filter, PageRequest::new(query.page, query.page_size))
        .await?;

    let now = Utc::now();
    Ok(HttpResponse::Ok().json(paged(page, |user| user_response(&user, now))))
}

/// GET /api/users/{id}
pub async fn get(
    state: web::Data<AppState>,
    CurrentUser(admin): CurrentUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = state.moderation.get_user(&admin, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user_response(&user, Utc::now())))
}

/// POST /api/users/{id}/block
///
/// Body: `{"until": "<RFC 3339>"}` or `{"duration_hours": N}`.
pub async fn block(
    state: web::Data<AppState>,
    CurrentUser(admin): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<BlockUserRequest>,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let until = block_deadline(&body, now)?;

    let user = state
        .moderation
        .block(&admin, path.into_inner(), until, now)
        .await?;

    let message = format!("User blocked until {}", until.to_rfc3339());
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        user_response(&user, now),
        message,
    )))
}

/// POST /api/users/{id}/unblock
pub async fn unblock(
    state: web::Data<AppState>,
    CurrentUser(admin): CurrentUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let user = state
        .moderation
        .unblock(&admin, path.into_inner(), now)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        user_response(&user, now),
        "User unblocked",
    )))
}

/// POST /api/users/{id}/toggle-role
pub async fn toggle_role(
    state: web::Data<AppState>,
    CurrentUser(admin): CurrentUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let user = state
        .moderation
        .toggle_role(&admin, path.into_inner(), now)
        .await?;

    let message = format!("Role changed to {}", user.role);
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        user_response(&user, now),
        message,
    )))
}

/// Resolve the block request to an absolute expiry.
fn block_deadline(req: &BlockUserRequest, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
    match (req.until, req.duration_hours) {
        (Some(until), None) => Ok(until),
        (None, Some(hours)) if (1..=MAX_BLOCK_HOURS).contains(&hours) => {
            Ok(now + TimeDelta::hours(hours))
        }
        (None, Some(_)) => Err(AppError::BadRequest(format!(
            "duration_hours must be between 1 and {}",
            MAX_BLOCK_HOURS
        ))),
        _ => Err(AppError::BadRequest(
            "Provide exactly one of 'until' or 'duration_hours'".to_string(),
        )),
    }
}
