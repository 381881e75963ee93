use axum::{response::{IntoResponse, Response}, http::StatusCode};
use log::error;
use thiserror::Error;
use tokio::task::JoinError;

use crate::{api_response::ApiResponse, data_layer_error::DataLayerError, services::token_service::error::TokenError};

pub type Result<T> = std::result::Result<T, AccountServiceError>;

#[derive(Debug, Error)]
pub enum AccountServiceError {
    #[error("An internal server error has occurred")]
    DataLayerError(DataLayerError),
    #[error("{0}")]
    TokenError(TokenError),
    #[error("An internal server error has occurred")]
    PasswordHashError(argon2::Error),
    #[error("An internal server error has occurred")]
    BlockingTaskFailed(#[from] JoinError),
    #[error("{0}")]
    MissingFields(&'static str),
    #[error("User with username or email already exists")]
    UserAlreadyExists,
    #[error("Email `{0}` is already in use")]
    EmailTaken(String),
    #[error("User does not exist")]
    UserNotFound,
    #[error("Invalid user credentials")]
    InvalidCredentials,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("No user logged in")]
    NotLoggedIn,
    #[error("Unauthorized request")]
    RefreshTokenMissing,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token is expired or used")]
    RefreshTokenReused,
    #[error("Something went wrong while generating refresh and access tokens")]
    TokenGenerationFailed,
    #[error("Something went wrong while registering the user")]
    RegistrationFailed,
}

impl AccountServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountServiceError::TokenError(e) => e.status_code(),
            AccountServiceError::MissingFields(_)
            | AccountServiceError::InvalidPassword
            | AccountServiceError::NotLoggedIn => StatusCode::BAD_REQUEST,
            AccountServiceError::InvalidCredentials
            | AccountServiceError::RefreshTokenMissing
            | AccountServiceError::InvalidRefreshToken
            | AccountServiceError::RefreshTokenReused => StatusCode::UNAUTHORIZED,
            AccountServiceError::UserNotFound => StatusCode::NOT_FOUND,
            AccountServiceError::UserAlreadyExists
            | AccountServiceError::EmailTaken(_) => StatusCode::CONFLICT,
            AccountServiceError::DataLayerError(_)
            | AccountServiceError::PasswordHashError(_)
            | AccountServiceError::BlockingTaskFailed(_)
            | AccountServiceError::TokenGenerationFailed
            | AccountServiceError::RegistrationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DataLayerError> for AccountServiceError {
    fn from(e: DataLayerError) -> Self {
        AccountServiceError::DataLayerError(e)
    }
}

impl From<TokenError> for AccountServiceError {
    fn from(e: TokenError) -> Self {
        AccountServiceError::TokenError(e)
    }
}

impl IntoResponse for AccountServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{:?}", self);
        }
        ApiResponse::failure(status, self.to_string()).into_response()
    }
}
