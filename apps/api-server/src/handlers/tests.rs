use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use notepad_core::services::Registration;
use notepad_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

use super::configure_routes;
use crate::state::{AppState, Repositories};

const PASSWORD: &str = "correct-horse";

fn test_state() -> AppState {
    AppState::from_parts(
        Repositories::in_memory(),
        Arc::new(JwtTokenService::new(JwtConfig {
            secret: "handler-tests".to_string(),
            expiration_hours: 1,
            issuer: "notepad-tests".to_string(),
        })),
        Arc::new(Argon2PasswordService::new()),
    )
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(configure_routes),
        )
        .await
    };
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Register through the API and return `(token, user_id)`.
macro_rules! register {
    ($app:expr, $name:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": $name,
                "email": format!("{}@example.com", $name),
                "password": PASSWORD,
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }};
}

macro_rules! login {
    ($app:expr, $login:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "login": $login, "password": PASSWORD }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["access_token"].as_str().unwrap().to_string()
    }};
}

async fn with_admin(state: &AppState) {
    state
        .auth
        .ensure_admin(Registration {
            username: "root".into(),
            email: "root@example.com".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
}

#[actix_web::test]
async fn test_health_reports_store() {
    let app = test_app!(test_state());

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[actix_web::test]
async fn test_register_then_me() {
    let app = test_app!(test_state());

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice",
            "email": "Alice@Example.com",
            "password": PASSWORD,
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "user");
    let token = body["access_token"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "alice");
    assert_eq!(me["is_blocked"], false);
}

#[actix_web::test]
async fn test_register_rejects_invalid_and_duplicate_input() {
    let app = test_app!(test_state());

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "a", "email": "nope", "password": "short" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let problem: Value = test::read_body_json(res).await;
    assert_eq!(problem["status"], 400);
    assert!(problem["detail"].as_str().unwrap().contains("Invalid email"));

    register!(app, "alice");
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice",
            "email": "other@example.com",
            "password": PASSWORD,
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_malformed_json_is_a_problem_response() {
    let app = test_app!(test_state());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let problem: Value = test::read_body_json(res).await;
    assert_eq!(problem["title"], "Bad Request");
}

#[actix_web::test]
async fn test_login_failures_are_unauthorized() {
    let app = test_app!(test_state());
    register!(app, "bob");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "login": "bob", "password": "wrong-horse" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let problem: Value = test::read_body_json(res).await;
    assert_eq!(problem["title"], "Authentication Required");

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_chord_crud_and_diagrams() {
    let app = test_app!(test_state());
    let (alice, alice_id) = register!(app, "alice");
    let (bob, _) = register!(app, "bob");

    // Anonymous writes are rejected
    let req = test::TestRequest::post()
        .uri("/api/chords")
        .set_json(json!({ "name": "F", "fingering": "133211" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/chords")
        .insert_header(bearer(&alice))
        .set_json(json!({
            "name": "F major",
            "fingering": "1-3-3-2-1-1",
            "description": "full barre",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string();
    let chord: Value = test::read_body_json(res).await;
    assert_eq!(chord["fingering"], "133211");
    assert_eq!(chord["author_id"], alice_id.as_str());
    assert_eq!(location, format!("/api/chords/{}", chord["id"].as_str().unwrap()));

    let req = test::TestRequest::get().uri(&location).to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["name"], "F major");

    let req = test::TestRequest::get()
        .uri(&format!("{}/diagram", location))
        .to_request();
    let diagram: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(diagram["diagram"]["base_fret"], 1);
    assert_eq!(diagram["diagram"]["barre"]["fret"], 1);
    assert_eq!(diagram["diagram"]["barre"]["first_string"], 0);
    assert_eq!(diagram["diagram"]["barre"]["last_string"], 5);

    let req = test::TestRequest::get()
        .uri(&format!("{}/diagram.svg", location))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/svg+xml"
    );
    let svg = test::read_body(res).await;
    assert!(std::str::from_utf8(&svg).unwrap().starts_with("<svg"));

    // Only the author may edit
    let req = test::TestRequest::put()
        .uri(&location)
        .insert_header(bearer(&bob))
        .set_json(json!({ "name": "Mine now" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::put()
        .uri(&location)
        .insert_header(bearer(&alice))
        .set_json(json!({ "description": "" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["description"], Value::Null);

    let req = test::TestRequest::delete()
        .uri(&location)
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get().uri(&location).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_chord_listing_and_preview() {
    let app = test_app!(test_state());
    let (alice, _) = register!(app, "alice");

    for (name, fingering) in [("Am", "X02210"), ("C", "X32010"), ("Em", "022000")] {
        let req = test::TestRequest::post()
            .uri("/api/chords")
            .insert_header(bearer(&alice))
            .set_json(json!({ "name": name, "fingering": fingering }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/chords?page=1&page_size=2")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total_items"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"][0]["name"], "Am");

    let req = test::TestRequest::get()
        .uri("/api/chords?page=18446744073709551615&page_size=100")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = test::read_body_json(res).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 0);
    assert_eq!(page["total_items"], 3);

    let req = test::TestRequest::get()
        .uri("/api/chords?search=m")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total_items"], 2);

    let req = test::TestRequest::get()
        .uri("/api/chords/preview?fingering=8-10-10-9-8-8")
        .to_request();
    let preview: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(preview["fingering"], "8-10-10-9-8-8");
    assert_eq!(preview["base_fret"], 8);

    let req = test::TestRequest::get()
        .uri("/api/chords/preview?fingering=1332")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::get()
        .uri("/api/chords/not-a-uuid")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_user_admin_requires_admin_role() {
    let state = test_state();
    with_admin(&state).await;
    let app = test_app!(state);
    let (bob, _) = register!(app, "bob");

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let root = login!(app, "root");
    let req = test::TestRequest::get()
        .uri("/api/users?search=bo")
        .insert_header(bearer(&root))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["username"], "bob");
}

#[actix_web::test]
async fn test_block_and_unblock_take_effect_immediately() {
    let state = test_state();
    with_admin(&state).await;
    let app = test_app!(state);
    let (bob, bob_id) = register!(app, "bob");
    let root = login!(app, "root");

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/block", bob_id))
        .insert_header(bearer(&root))
        .set_json(json!({ "duration_hours": 24 }))
        .to_request();
    let blocked: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(blocked["success"], true);
    assert_eq!(blocked["data"]["is_blocked"], true);
    assert!(blocked["message"].as_str().unwrap().starts_with("User blocked until"));

    // The token Bob already holds stops working
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&bob))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let problem: Value = test::read_body_json(res).await;
    assert!(problem["detail"].as_str().unwrap().starts_with("Account blocked until"));

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "login": "bob@example.com", "password": PASSWORD }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/unblock", bob_id))
        .insert_header(bearer(&root))
        .to_request();
    let unblocked: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(unblocked["data"]["blocked_until"], Value::Null);

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_block_request_validation() {
    let state = test_state();
    with_admin(&state).await;
    let app = test_app!(state);
    let (_, bob_id) = register!(app, "bob");
    let root = login!(app, "root");

    for body in [
        json!({}),
        json!({ "duration_hours": 0 }),
        json!({ "until": "2001-01-01T00:00:00Z" }),
    ] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/users/{}/block", bob_id))
            .insert_header(bearer(&root))
            .set_json(body)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
}

#[actix_web::test]
async fn test_toggle_role_and_self_moderation() {
    let state = test_state();
    with_admin(&state).await;
    let app = test_app!(state);
    let (bob, bob_id) = register!(app, "bob");
    let root = login!(app, "root");

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/toggle-role", bob_id))
        .insert_header(bearer(&root))
        .to_request();
    let toggled: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(toggled["data"]["role"], "admin");

    // Bob's existing token now reaches admin routes
    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Nobody moderates their own account
    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/toggle-role", bob_id))
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_auth_routes_are_rate_limited() {
    use notepad_infra::{InMemoryRateLimiter, RateLimitConfig};

    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 2,
        window: std::time::Duration::from_secs(60),
    })
    .unwrap();
    let app = test_app!(test_state().with_rate_limiter(Arc::new(limiter)));

    let attempt = || {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "login": "ghost", "password": PASSWORD }))
            .to_request()
    };

    let first = test::call_service(&app, attempt()).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
    assert!(first.headers().contains_key("x-ratelimit-remaining"));
    assert_eq!(
        test::call_service(&app, attempt()).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let limited = test::call_service(&app, attempt()).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(header::RETRY_AFTER));

    // Chord browsing is not limited
    let req = test::TestRequest::get().uri("/api/chords").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
