//! HTTP handlers and route configuration.

mod auth;
mod chords;
mod convert;
mod health;
mod users;

#[cfg(test)]
mod tests;

use actix_web::{error, web};

use crate::middleware::error::AppError;

#[cfg(feature = "rate-limit")]
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let auth_scope = web::scope("/auth")
        .route("/register", web::post().to(auth::register))
        .route("/login", web::post().to(auth::login))
        .route("/me", web::get().to(auth::me));

    #[cfg(feature = "rate-limit")]
    let auth_scope = auth_scope.wrap(RateLimitMiddleware);

    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/api")
                // Public routes
                .route("/health", web::get().to(health::health_check))
                .service(auth_scope)
                .service(
                    web::scope("/chords")
                        .route("", web::get().to(chords::list))
                        .route("", web::post().to(chords::create))
                        // Before "/{id}" so "preview" is not parsed as an id
                        .route("/preview", web::get().to(chords::preview))
                        .route("/{id}", web::get().to(chords::get))
                        .route("/{id}", web::put().to(chords::update))
                        .route("/{id}", web::delete().to(chords::delete))
                        .route("/{id}/diagram", web::get().to(chords::diagram))
                        .route("/{id}/diagram.svg", web::get().to(chords::diagram_svg)),
                )
                // Admin routes
                .service(
                    web::scope("/users")
                        .route("", web::get().to(users::list))
                        .route("/{id}", web::get().to(users::get))
                        .route("/{id}/block", web::post().to(users::block))
                        .route("/{id}/unblock", web::post().to(users::unblock))
                        .route("/{id}/toggle-role", web::post().to(users::toggle_role)),
                ),
        );
}

// Extractor failures are rendered as problem details like every other error.

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            let detail = match &err {
                error::JsonPayloadError::ContentType => {
                    "Expected a JSON body (Content-Type: application/json)".to_string()
                }
                other => other.to_string(),
            };
            AppError::BadRequest(detail).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| match err {
        error::PathError::Deserialize(_) => {
            AppError::NotFound("No resource with that id".to_string()).into()
        }
        other => AppError::BadRequest(other.to_string()).into(),
    })
}
