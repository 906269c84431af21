//! Rate limiting middleware.

use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
    web,
};
use futures::future::LocalBoxFuture;
use notepad_shared::ErrorResponse;
use std::future::{Ready, ready};
use std::rc::Rc;

use crate::observability::RequestId;
use crate::state::AppState;

/// Per-client rate limiting for the wrapped scope.
///
/// Uses the limiter in [`AppState`]; requests pass untouched when none is set.
/// Clients are keyed by their real IP.
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.rate_limiter.clone());

        Box::pin(async move {
            let Some(limiter) = limiter else {
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            };

            let key = req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string();

            match limiter.check(&key).await {
                Ok(result) if !result.allowed => {
                    let retry_after = result.reset_after.as_secs().max(1);
                    tracing::warn!(client = %key, retry_after, "Rate limit exceeded");

                    let mut error = ErrorResponse::too_many_requests(format!(
                        "Rate limit exceeded. Try again in {} seconds.",
                        retry_after
                    ));
                    if let Some(request_id) = req.extensions().get::<RequestId>() {
                        error = error.with_request_id(request_id.as_str());
                    }

                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("Retry-After", retry_after.to_string()))
                        .json(error);

                    Ok(req.into_response(response).map_into_right_body())
                }
                Ok(result) => {
                    let mut res = service.call(req).await?;
                    res.headers_mut().insert(
                        HeaderName::from_static("x-ratelimit-remaining"),
                        HeaderValue::from(result.remaining),
                    );
                    Ok(res.map_into_left_body())
                }
                Err(e) => {
                    // Fail open: a broken limiter must not lock users out of login.
                    tracing::error!(error = %e, "Rate limiter error, failing open");
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
            }
        })
    }
}
