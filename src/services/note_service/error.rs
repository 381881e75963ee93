use axum::{response::{IntoResponse, Response}, http::StatusCode};
use log::error;
use thiserror::Error;

use crate::{api_response::ApiResponse, data_layer_error::DataLayerError};

pub type Result<T> = std::result::Result<T, NoteServiceError>;

#[derive(Debug, Error)]
pub enum NoteServiceError {
    #[error("An internal server error occurred")]
    DataLayerError(DataLayerError),
    #[error("All fields are required")]
    MissingFields,
    #[error("Note not found")]
    NoteNotFound,
    #[error("User not authorized to {0} this note")]
    NotNoteOwner(&'static str),
    #[error("No notes found for this user")]
    NoNotesFound,
    #[error("Something went wrong while creating the note")]
    CreateFailed,
}

impl NoteServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            NoteServiceError::MissingFields => StatusCode::BAD_REQUEST,
            NoteServiceError::NoteNotFound | NoteServiceError::NoNotesFound => StatusCode::NOT_FOUND,
            NoteServiceError::NotNoteOwner(_) => StatusCode::FORBIDDEN,
            NoteServiceError::DataLayerError(_)
            | NoteServiceError::CreateFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DataLayerError> for NoteServiceError {
    fn from(e: DataLayerError) -> Self {
        NoteServiceError::DataLayerError(e)
    }
}

impl IntoResponse for NoteServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let NoteServiceError::DataLayerError(e) = &self {
            error!("{:?}", e);
        }
        ApiResponse::failure(status, self.to_string()).into_response()
    }
}
