//! Authentication extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;

use notepad_core::domain::User;
use notepad_core::ports::{AuthError, TokenClaims};
use notepad_shared::ErrorResponse;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Identity carried by a valid bearer token.
///
/// Only proves the token was issued by us. [`CurrentUser`] resolves it
/// against the live account.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::TokenExpired => actix_web::http::StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken(_) => actix_web::http::StatusCode::UNAUTHORIZED,
            AuthError::MissingAuth => actix_web::http::StatusCode::UNAUTHORIZED,
            AuthError::HashingError(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::HashingError(_) => ErrorResponse::internal_error(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

fn identity_from_request(req: &HttpRequest) -> Result<Identity, AuthenticationError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AuthenticationError(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ))
    })?;

    let auth_str = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthenticationError(AuthError::MissingAuth))?
        .to_str()
        .map_err(|_| {
            AuthenticationError(AuthError::InvalidToken(
                "Invalid authorization header".to_string(),
            ))
        })?;

    // Parse "Bearer <token>"
    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        AuthenticationError(AuthError::InvalidToken(
            "Expected Bearer token".to_string(),
        ))
    })?;

    state
        .tokens
        .validate_token(token.trim())
        .map(Identity::from)
        .map_err(AuthenticationError)
}

/// The live, unblocked account behind the bearer token.
///
/// Re-read on every request so a block or a demotion takes effect
/// immediately, whatever the token says.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = identity_from_request(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let identity = identity?;
            tracing::debug!(user_id = %identity.user_id, username = %identity.username, "Resolving current user");
            let state = state.ok_or_else(|| AppError::Internal("AppState missing".to_string()))?;

            let user = state
                .auth
                .current_user(identity.user_id, chrono::Utc::now())
                .await
                .map_err(AppError::from)?;

            Ok(CurrentUser(user))
        })
    }
}
