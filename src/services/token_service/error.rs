use axum::{response::{IntoResponse, Response}, http::StatusCode};
use log::{error, warn};
use thiserror::Error;

use crate::api_response::ApiResponse;

pub type Result<T> = std::result::Result<T, TokenError>;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token expired - please login again")]
    TokenStale,
    #[error("Invalid token")]
    JwtError(#[from] jwt::Error),
    ///
    /// `Hmac::new_from_slice` is fallible by signature only: HMAC accepts
    /// keys of any length, so this is never raised with the SHA-256 key
    ///
    #[error("Token signing key is invalid")]
    InvalidKey,
}

impl TokenError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenError::InvalidKey => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{:?}", self);
        } else {
            warn!("{:?}", self);
        }
        ApiResponse::failure(status, self.to_string()).into_response()
    }
}
