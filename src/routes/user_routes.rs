use std::sync::Arc;

use axum::{Router, routing::{get, patch, post}, extract::{FromRef, State}, http::StatusCode, response::Response, middleware};
use serde_json::{json, Value};
use tower_cookies::{Cookie, Cookies, cookie::{SameSite, time::Duration}};

use crate::{
    api_response::{ApiResponse, with_status},
    extractors::Payload,
    middleware::auth_middleware::{auth_middleware, AuthContext, AuthGuard, ACCESS_TOKEN_COOKIE},
    services::{
        account_service::{
            AccountService,
            error::Result,
            models::{UserModel, LoginModel, AuthStatusModel, RegisterUserDto, LoginDto, UpdateAccountDto, ChangePasswordDto, RefreshTokenDto},
        },
        token_service::{settings::TokenSettings, models::AuthTokensModel},
    },
};

pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

#[derive(Clone, FromRef)]
pub struct UserRoutesState {
    account_service: Arc<dyn AccountService>,
    token_settings: TokenSettings,
}

pub fn routes(account_service: Arc<dyn AccountService>, guard: AuthGuard, token_settings: TokenSettings) -> Router {
    Router::new()
        // Secured routes
        .route("/logout", get(logout))
        .route("/current-user", get(current_user))
        .route("/auth-status", get(auth_status))
        .route("/update-account", patch(update_account))
        .route("/change-password", patch(change_password))
        // Auth middleware (only applies to the routes above)
        .route_layer(middleware::from_fn_with_state(guard, auth_middleware))
        // Public routes
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", get(refresh_token))
        // State
        .with_state(UserRoutesState { account_service, token_settings })
}

async fn register(
    State(account_service): State<Arc<dyn AccountService>>,
    Payload(dto): Payload<RegisterUserDto>,
) -> Result<Response> {
    let user = account_service.create_new_user(dto).await?;
    Ok(with_status(StatusCode::CREATED, ApiResponse::ok(user, "User registered successfully")))
}

async fn login(
    State(account_service): State<Arc<dyn AccountService>>,
    State(settings): State<TokenSettings>,
    cookies: Cookies,
    Payload(dto): Payload<LoginDto>,
) -> Result<ApiResponse<LoginModel>> {
    let login = account_service.try_accept_creds(dto).await?;
    set_token_cookies(&cookies, &settings, &login.tokens);

    Ok(ApiResponse::ok(login, "User Logged In successfully"))
}

async fn refresh_token(
    State(account_service): State<Arc<dyn AccountService>>,
    State(settings): State<TokenSettings>,
    cookies: Cookies,
    body: Option<Payload<RefreshTokenDto>>,
) -> Result<ApiResponse<AuthTokensModel>> {
    // Prefer the cookie, falling back to the request body
    let presented = cookies.get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| body.and_then(|Payload(dto)| dto.refresh_token));

    let tokens = account_service.try_accept_refresh(presented).await?;
    set_token_cookies(&cookies, &settings, &tokens);

    Ok(ApiResponse::ok(tokens, "Access Token Refreshed successfully"))
}

async fn logout(
    State(account_service): State<Arc<dyn AccountService>>,
    cookies: Cookies,
    ctx: AuthContext,
) -> Result<ApiResponse<Value>> {
    account_service.logout(ctx.user_id()).await?;

    // Expire both cookies, whether or not the client sent them
    cookies.add(token_cookie(ACCESS_TOKEN_COOKIE, String::new(), 0));
    cookies.add(token_cookie(REFRESH_TOKEN_COOKIE, String::new(), 0));

    Ok(ApiResponse::ok(json!({}), "User Logged Out successfully"))
}

async fn current_user(
    State(account_service): State<Arc<dyn AccountService>>,
    ctx: Option<AuthContext>,
) -> Result<ApiResponse<UserModel>> {
    let user = account_service.get_current_user(ctx.map(|c| c.user_id())).await?;
    Ok(ApiResponse::ok(user, "Current User Fetched successfully"))
}

async fn auth_status(
    State(account_service): State<Arc<dyn AccountService>>,
    ctx: Option<AuthContext>,
) -> ApiResponse<AuthStatusModel> {
    let status = account_service.check_auth_status(ctx.map(|c| c.user_id()));
    let message = if status.is_authenticated { "User is authenticated" } else { "User is not authenticated" };

    ApiResponse::new(status.status_code(), status, message)
}

async fn update_account(
    State(account_service): State<Arc<dyn AccountService>>,
    ctx: AuthContext,
    Payload(dto): Payload<UpdateAccountDto>,
) -> Result<ApiResponse<UserModel>> {
    let user = account_service.update_account_details(ctx.user_id(), dto).await?;
    Ok(ApiResponse::ok(user, "Account Details Updated successfully"))
}

async fn change_password(
    State(account_service): State<Arc<dyn AccountService>>,
    ctx: AuthContext,
    Payload(dto): Payload<ChangePasswordDto>,
) -> Result<ApiResponse<Value>> {
    account_service.change_current_password(ctx.user_id(), dto).await?;
    Ok(ApiResponse::ok(json!({}), "Password Changed successfully"))
}

fn set_token_cookies(cookies: &Cookies, settings: &TokenSettings, tokens: &AuthTokensModel) {
    cookies.add(token_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone(), settings.access_token_lifetime_s));
    cookies.add(token_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone(), settings.refresh_token_lifetime_s));
}

fn token_cookie(name: &'static str, value: String, max_age_s: i64) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(Duration::seconds(max_age_s))
        .finish()
}
