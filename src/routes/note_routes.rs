use std::sync::Arc;

use axum::{Router, routing::{delete, get, patch, post}, extract::{FromRef, State}, http::StatusCode, response::Response, middleware};
use serde_json::{json, Value};

use crate::{
    api_response::{ApiResponse, with_status},
    extractors::{ApiPath, Payload},
    middleware::auth_middleware::{auth_middleware, AuthContext, AuthGuard},
    services::note_service::{NoteService, error::Result, models::{NoteDto, NoteModel}},
};

#[derive(Clone, FromRef)]
pub struct NoteRoutesState {
    note_service: Arc<dyn NoteService>,
}

pub fn routes(note_service: Arc<dyn NoteService>, guard: AuthGuard) -> Router {
    Router::new()
        // Routes
        .route("/create", post(create_note))
        .route("/all", get(all_notes))
        .route("/pinned", get(pinned_notes))
        .route("/update/:id", patch(update_note))
        .route("/pin/:id", patch(pin_note))
        .route("/delete/:id", delete(delete_note))
        // Auth middleware
        .route_layer(middleware::from_fn_with_state(guard, auth_middleware))
        // State
        .with_state(NoteRoutesState { note_service })
}

async fn create_note(
    State(note_service): State<Arc<dyn NoteService>>,
    ctx: AuthContext,
    Payload(dto): Payload<NoteDto>,
) -> Result<Response> {
    let note = note_service.create_note(ctx.user_id(), dto).await?;
    Ok(with_status(StatusCode::CREATED, ApiResponse::ok(note, "Note created successfully")))
}

async fn all_notes(
    State(note_service): State<Arc<dyn NoteService>>,
    ctx: AuthContext,
) -> Result<ApiResponse<Vec<NoteModel>>> {
    let notes = note_service.get_all_notes(ctx.user_id()).await?;
    Ok(ApiResponse::ok(notes, "Notes fetched successfully"))
}

async fn pinned_notes(
    State(note_service): State<Arc<dyn NoteService>>,
    ctx: AuthContext,
) -> Result<ApiResponse<Vec<NoteModel>>> {
    let notes = note_service.get_pinned_notes(ctx.user_id()).await?;
    Ok(ApiResponse::ok(notes, "Notes fetched successfully"))
}

async fn update_note(
    State(note_service): State<Arc<dyn NoteService>>,
    ApiPath(id): ApiPath<i64>,
    ctx: AuthContext,
    Payload(dto): Payload<NoteDto>,
) -> Result<ApiResponse<NoteModel>> {
    let note = note_service.update_note(ctx.user_id(), id, dto).await?;
    Ok(ApiResponse::ok(note, "Note updated successfully"))
}

async fn pin_note(
    State(note_service): State<Arc<dyn NoteService>>,
    ApiPath(id): ApiPath<i64>,
    ctx: AuthContext,
) -> Result<ApiResponse<NoteModel>> {
    let res = note_service.pin_note(ctx.user_id(), id).await?;
    let message = res.message();
    Ok(ApiResponse::ok(res.note, message))
}

async fn delete_note(
    State(note_service): State<Arc<dyn NoteService>>,
    ApiPath(id): ApiPath<i64>,
    ctx: AuthContext,
) -> Result<ApiResponse<Value>> {
    note_service.delete_note(ctx.user_id(), id).await?;
    Ok(ApiResponse::ok(json!({}), "Note deleted successfully"))
}
