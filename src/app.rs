use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use sqlx::SqlitePool;
use tower_cookies::CookieManagerLayer;

use crate::{
    middleware::auth_middleware::AuthGuard,
    routes::{note_routes, user_routes},
    services::{
        account_service::{AccountService, CoreAccountService, data_layer::DbAccountDataLayer},
        note_service::{NoteService, CoreNoteService, data_layer::DbNoteDataLayer},
        token_service::{TokenService, CoreTokenService, settings::TokenSettings},
    },
};

const BODY_LIMIT_BYTES: usize = 32 * 1024;

///
/// Every service the API depends on, built once at start-up and
/// shared with the request handlers
///
#[derive(Clone)]
pub struct AppServices {
    pub token_service: Arc<dyn TokenService>,
    pub account_service: Arc<dyn AccountService>,
    pub note_service: Arc<dyn NoteService>,
}

impl AppServices {
    pub fn new(db: SqlitePool, token_settings: TokenSettings) -> Self {
        let token_service: Arc<dyn TokenService> = Arc::new(CoreTokenService::new(token_settings));

        let account_data_layer = Arc::new(DbAccountDataLayer::new(db.clone()));
        let account_service = Arc::new(CoreAccountService::new(account_data_layer, token_service.clone()));

        let note_data_layer = Arc::new(DbNoteDataLayer::new(db));
        let note_service = Arc::new(CoreNoteService::new(note_data_layer));

        Self { token_service, account_service, note_service }
    }

    pub fn auth_guard(&self) -> AuthGuard {
        AuthGuard::new(self.token_service.clone(), self.account_service.clone())
    }
}

///
/// Builds the `/api/v1` router. Cookie handling and the request body
/// limit are included; tracing, CORS and static files are left to the caller.
///
pub fn build_router(services: &AppServices) -> Router {
    let token_settings = services.token_service.settings().clone();

    Router::new()
        .nest("/api/v1/user", user_routes::routes(services.account_service.clone(), services.auth_guard(), token_settings))
        .nest("/api/v1/notes", note_routes::routes(services.note_service.clone(), services.auth_guard()))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CookieManagerLayer::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{header, Method, Request, StatusCode}};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::services::{account_service::tests::test_pool, token_service::test_settings};

    async fn app() -> Router {
        build_router(&AppServices::new(test_pool().await, test_settings()))
    }

    struct Reply {
        status: StatusCode,
        body: Value,
        set_cookies: Vec<String>,
    }

    async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, cookie: Option<&str>, body: Option<Value>) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(body) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }.unwrap();

        read_reply(app.clone().oneshot(req).await.unwrap()).await
    }

    async fn send_raw(app: &Router, uri: &str, content_type: Option<&str>, body: impl Into<String>) -> Reply {
        let mut req = Request::builder().method(Method::POST).uri(uri);
        if let Some(content_type) = content_type {
            req = req.header(header::CONTENT_TYPE, content_type);
        }
        let req = req.body(Body::from(body.into())).unwrap();

        read_reply(app.clone().oneshot(req).await.unwrap()).await
    }

    async fn read_reply(res: axum::response::Response) -> Reply {
        let status = res.status();
        let set_cookies = res.headers().get_all(header::SET_COOKIE).iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Reply { status, body, set_cookies }
    }

    async fn register(app: &Router, username: &str) -> Reply {
        send(app, Method::POST, "/api/v1/user/register", None, None, Some(json!({
            "fullName": "Test User",
            "email": format!("{username}@mail.com"),
            "username": username,
            "password": "secret",
        }))).await
    }

    async fn login(app: &Router, username: &str) -> Reply {
        send(app, Method::POST, "/api/v1/user/login", None, None, Some(json!({
            "username": username,
            "password": "secret",
        }))).await
    }

    fn access_token(reply: &Reply) -> String {
        reply.body["data"]["accessToken"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_end_to_end_notes_flow() {
        let app = app().await;

        let reply = register(&app, "alice").await;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body["data"]["username"], "alice");
        assert!(reply.body["data"].get("pwdHash").is_none());
        assert!(reply.body["data"].get("refreshToken").is_none());

        let reply = login(&app, "alice").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["success"], true);
        let token = access_token(&reply);

        let reply = send(&app, Method::POST, "/api/v1/notes/create", Some(&token), None, Some(json!({ "title": "T", "content": "C" }))).await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let id = reply.body["data"]["id"].as_i64().unwrap();

        let reply = send(&app, Method::PATCH, &format!("/api/v1/notes/pin/{id}"), Some(&token), None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Note pinned successfully");

        let reply = send(&app, Method::GET, "/api/v1/notes/pinned", Some(&token), None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        let pinned = reply.body["data"].as_array().unwrap();
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0]["id"], id);
        assert_eq!(pinned[0]["isPinned"], true);

        let reply = send(&app, Method::DELETE, &format!("/api/v1/notes/delete/{id}"), Some(&token), None, None).await;
        assert_eq!(reply.status, StatusCode::OK);

        let reply = send(&app, Method::GET, "/api/v1/notes/all", Some(&token), None, None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["success"], false);
        assert_eq!(reply.body["statusCode"], 404);
    }

    #[tokio::test]
    async fn test_unauthenticated_requests_rejected() {
        let app = app().await;

        let reply = send(&app, Method::POST, "/api/v1/notes/create", None, None, Some(json!({ "title": "T", "content": "C" }))).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["statusCode"], 401);

        let reply = send(&app, Method::GET, "/api/v1/user/current-user", Some("bogus"), None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden() {
        let app = app().await;
        register(&app, "alice").await;
        register(&app, "bob").await;
        let alice = access_token(&login(&app, "alice").await);
        let bob = access_token(&login(&app, "bob").await);

        let reply = send(&app, Method::POST, "/api/v1/notes/create", Some(&alice), None, Some(json!({ "title": "T", "content": "C" }))).await;
        let id = reply.body["data"]["id"].as_i64().unwrap();

        let reply = send(&app, Method::PATCH, &format!("/api/v1/notes/update/{id}"), Some(&bob), None, Some(json!({ "title": "X", "content": "Y" }))).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);

        let reply = send(&app, Method::DELETE, "/api/v1/notes/delete/9999", Some(&bob), None, None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_sets_cookies_and_cookie_auth_works() {
        let app = app().await;
        register(&app, "alice").await;

        let reply = login(&app, "alice").await;
        let access = reply.set_cookies.iter().find(|c| c.starts_with("accessToken=")).unwrap();
        let refresh = reply.set_cookies.iter().find(|c| c.starts_with("refreshToken=")).unwrap();
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("Secure"));
        assert!(access.contains("SameSite=None"));
        assert!(access.contains("Max-Age=60"));
        assert!(refresh.contains("Max-Age=120"));

        let cookie = access.split(';').next().unwrap();
        let reply = send(&app, Method::GET, "/api/v1/user/current-user", None, Some(cookie), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["username"], "alice");

        let reply = send(&app, Method::GET, "/api/v1/user/auth-status", None, Some(cookie), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["isAuthenticated"], true);
    }

    #[tokio::test]
    async fn test_refresh_token_rotation() {
        let app = app().await;
        register(&app, "alice").await;
        let reply = login(&app, "alice").await;
        let old = reply.body["data"]["refreshToken"].as_str().unwrap().to_string();

        // Through the request body
        let reply = send(&app, Method::GET, "/api/v1/user/refresh-token", None, None, Some(json!({ "refreshToken": old }))).await;
        assert_eq!(reply.status, StatusCode::OK);
        let new = reply.body["data"]["refreshToken"].as_str().unwrap().to_string();
        assert_ne!(old, new);
        assert!(reply.set_cookies.iter().any(|c| c.starts_with("refreshToken=") && c.contains("Max-Age=120")));

        // Reusing the rotated-out token fails
        let reply = send(&app, Method::GET, "/api/v1/user/refresh-token", None, None, Some(json!({ "refreshToken": old }))).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

        // Through the cookie
        let cookie = format!("refreshToken={new}");
        let reply = send(&app, Method::GET, "/api/v1/user/refresh-token", None, Some(&cookie), None).await;
        assert_eq!(reply.status, StatusCode::OK);

        let reply = send(&app, Method::GET, "/api/v1/user/refresh-token", None, None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let app = app().await;
        register(&app, "alice").await;
        let reply = login(&app, "alice").await;
        let token = access_token(&reply);
        let refresh = reply.body["data"]["refreshToken"].as_str().unwrap().to_string();

        let reply = send(&app, Method::GET, "/api/v1/user/logout", Some(&token), None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.set_cookies.iter().any(|c| c.starts_with("accessToken=") && c.contains("Max-Age=0")));
        assert!(reply.set_cookies.iter().any(|c| c.starts_with("refreshToken=") && c.contains("Max-Age=0")));

        let reply = send(&app, Method::GET, "/api/v1/user/refresh-token", None, None, Some(json!({ "refreshToken": refresh }))).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_account_updates() {
        let app = app().await;
        register(&app, "alice").await;
        let token = access_token(&login(&app, "alice").await);

        let reply = send(&app, Method::PATCH, "/api/v1/user/update-account", Some(&token), None, Some(json!({ "fullName": "Alice", "email": "ALICE2@mail.com" }))).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["email"], "alice2@mail.com");

        let reply = send(&app, Method::PATCH, "/api/v1/user/change-password", Some(&token), None, Some(json!({ "oldPassword": "wrong", "newPassword": "next" }))).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let reply = send(&app, Method::PATCH, "/api/v1/user/change-password", Some(&token), None, Some(json!({ "oldPassword": "secret", "newPassword": "next" }))).await;
        assert_eq!(reply.status, StatusCode::OK);

        let reply = register(&app, "alice").await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
    }

    fn assert_failure_envelope(reply: &Reply, status: StatusCode) {
        assert_eq!(reply.status, status);
        assert_eq!(reply.body["statusCode"], status.as_u16());
        assert_eq!(reply.body["success"], false);
        assert!(reply.body["data"].is_null());
        assert!(reply.body["message"].is_string());
    }

    #[tokio::test]
    async fn test_bad_requests_use_envelope() {
        let app = app().await;

        let reply = send_raw(&app, "/api/v1/user/register", Some("application/json"), "{not json").await;
        assert_failure_envelope(&reply, StatusCode::BAD_REQUEST);

        let reply = send_raw(&app, "/api/v1/user/login", None, r#"{"username":"alice","password":"secret"}"#).await;
        assert_failure_envelope(&reply, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let reply = send_raw(&app, "/api/v1/user/register", Some("application/json"), r#"{"fullName":5}"#).await;
        assert_failure_envelope(&reply, StatusCode::UNPROCESSABLE_ENTITY);

        let big = format!(r#"{{"fullName":"{}"}}"#, "a".repeat(40 * 1024));
        let reply = send_raw(&app, "/api/v1/user/register", Some("application/json"), big).await;
        assert_failure_envelope(&reply, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_bad_path_param_uses_envelope() {
        let app = app().await;
        register(&app, "alice").await;
        let token = access_token(&login(&app, "alice").await);

        let reply = send(&app, Method::PATCH, "/api/v1/notes/pin/abc", Some(&token), None, None).await;
        assert_failure_envelope(&reply, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_form_encoded_bodies() {
        let app = app().await;

        let reply = send_raw(&app, "/api/v1/user/register", Some("application/x-www-form-urlencoded"),
            "fullName=Form+User&email=form%40mail.com&username=form&password=secret").await;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body["data"]["email"], "form@mail.com");

        let reply = send_raw(&app, "/api/v1/user/login", Some("application/x-www-form-urlencoded"), "username=form&password=secret").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body["data"]["accessToken"].is_string());
    }

    #[tokio::test]
    async fn test_empty_cookies_fall_back() {
        let app = app().await;
        register(&app, "alice").await;
        let reply = login(&app, "alice").await;
        let token = access_token(&reply);
        let refresh = reply.body["data"]["refreshToken"].as_str().unwrap().to_string();

        // Empty access cookie, valid bearer header
        let reply = send(&app, Method::GET, "/api/v1/user/current-user", Some(&token), Some("accessToken="), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["username"], "alice");

        // Empty refresh cookie, valid body
        let reply = send(&app, Method::GET, "/api/v1/user/refresh-token", None, Some("refreshToken="), Some(json!({ "refreshToken": refresh }))).await;
        assert_eq!(reply.status, StatusCode::OK);
    }
}
