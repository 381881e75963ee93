use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    TypedHeader,
};
use derive_more::Constructor;
use log::{error, warn};
use thiserror::Error;
use tower_cookies::Cookies;

use crate::{
    api_response::ApiResponse,
    services::{
        account_service::{AccountService, error::AccountServiceError, models::UserModel},
        token_service::{TokenService, error::TokenError},
    },
};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

pub type Result<T> = std::result::Result<T, AuthGuardError>;

#[derive(Debug, Error)]
pub enum AuthGuardError {
    #[error("Unauthorized request")]
    MissingToken,
    #[error("Invalid access token")]
    InvalidToken(TokenError),
    #[error("Invalid access token")]
    UserNotFound,
    #[error("An internal server error has occurred")]
    AccountServiceError(AccountServiceError),
}

impl IntoResponse for AuthGuardError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthGuardError::AccountServiceError(e) => {
                error!("{:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            },
            _ => StatusCode::UNAUTHORIZED,
        };
        ApiResponse::failure(status, self.to_string()).into_response()
    }
}

///
/// The authenticated user, attached to the request by `auth_middleware`
///
#[derive(Clone, Debug)]
pub struct AuthContext { pub user: UserModel }

impl AuthContext {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

#[async_trait]
impl <S : Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = AuthGuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthContext>()
            .cloned()
            .ok_or(AuthGuardError::MissingToken)
    }
}

#[derive(Clone, Constructor)]
pub struct AuthGuard {
    token_service: Arc<dyn TokenService>,
    account_service: Arc<dyn AccountService>,
}

impl AuthGuard {
    ///
    /// Verifies the access token and loads the user it belongs to
    ///
    pub async fn authenticate(&self, access_token: Option<&str>) -> Result<AuthContext> {
        let access_token = access_token.filter(|t| !t.is_empty())
            .ok_or(AuthGuardError::MissingToken)?;

        let claims = self.token_service.verify_access_token(access_token)
            .map_err(AuthGuardError::InvalidToken)?;

        let user = self.account_service.find_user(claims.user_id).await
            .map_err(AuthGuardError::AccountServiceError)?
            .ok_or(AuthGuardError::UserNotFound)?;

        Ok(AuthContext { user })
    }
}

///
/// Rejects the request with 401 unless it carries a valid access token, either
/// in the `accessToken` cookie or as a bearer token. On success the
/// `AuthContext` is attached to the request.
///
pub async fn auth_middleware<B : Send> (
    State(guard): State<AuthGuard>,
    cookies: Cookies,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<B>,
    next: Next<B>
) -> Result<Response> {
    let access_token = cookies.get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| bearer.map(|b| b.token().to_string()));

    let ctx = guard.authenticate(access_token.as_deref()).await
        .map_err(|e| {
            if let AuthGuardError::InvalidToken(err) = &e {
                warn!("Rejected access token: {}", err);
            }
            e
        })?;

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
