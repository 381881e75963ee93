pub mod error;
pub mod data_layer;
pub mod models;

use std::sync::Arc;

use axum::async_trait;
use derive_more::Constructor;
use log::warn;

use self::{
    error::{Result, NoteServiceError},
    data_layer::NoteDataLayer,
    models::{NoteModel, NoteDto, PinResultModel},
};

///
/// Service which manages a user's notes. Notes can only be
/// changed or removed by the user who owns them.
///
#[async_trait]
pub trait NoteService : Send + Sync {
    ///
    /// Creates a new note owned by `owner_id`. Both title and content are required
    ///
    async fn create_note(&self, owner_id: i64, dto: NoteDto) -> Result<NoteModel>;
    ///
    /// Deletes the note. Returns `NoteNotFound` if it doesn't exist, and
    /// `NotNoteOwner` if it belongs to someone else
    ///
    async fn delete_note(&self, owner_id: i64, note_id: i64) -> Result<()>;
    ///
    /// Replaces the note's title and content, with the same checks as `delete_note`
    ///
    async fn update_note(&self, owner_id: i64, note_id: i64, dto: NoteDto) -> Result<NoteModel>;
    ///
    /// Flips the note's pinned state, with the same checks as `delete_note`
    ///
    async fn pin_note(&self, owner_id: i64, note_id: i64) -> Result<PinResultModel>;
    ///
    /// Returns all the user's notes, newest first.
    /// Returns `NoNotesFound` if the user has none
    ///
    async fn get_all_notes(&self, owner_id: i64) -> Result<Vec<NoteModel>>;
    ///
    /// Returns the user's pinned notes, newest first.
    /// Returns `NoNotesFound` if the user has none
    ///
    async fn get_pinned_notes(&self, owner_id: i64) -> Result<Vec<NoteModel>>;
}

#[derive(Clone, Constructor)]
pub struct CoreNoteService {
    data_layer: Arc<dyn NoteDataLayer>,
}

#[async_trait]
impl NoteService for CoreNoteService {
    async fn create_note(&self, owner_id: i64, dto: NoteDto) -> Result<NoteModel> {
        let (title, content) = required_fields(&dto)?;

        let id = self.data_layer.create_note(owner_id, title, content).await?;

        // Re-fetch the note to confirm it was stored
        let note = self.data_layer.get_note_by_id(id).await?
            .ok_or(NoteServiceError::CreateFailed)?;

        Ok(note.into())
    }

    async fn delete_note(&self, owner_id: i64, note_id: i64) -> Result<()> {
        if self.data_layer.delete_note(note_id, owner_id).await? {
            return Ok(());
        }
        Err(self.explain_miss(owner_id, note_id, "delete").await?)
    }

    async fn update_note(&self, owner_id: i64, note_id: i64, dto: NoteDto) -> Result<NoteModel> {
        let (title, content) = required_fields(&dto)?;

        match self.data_layer.update_note(note_id, owner_id, title, content).await? {
            Some(note) => Ok(note.into()),
            None => Err(self.explain_miss(owner_id, note_id, "update").await?),
        }
    }

    async fn pin_note(&self, owner_id: i64, note_id: i64) -> Result<PinResultModel> {
        match self.data_layer.toggle_pin(note_id, owner_id).await? {
            Some(note) => Ok(PinResultModel { note: note.into() }),
            None => Err(self.explain_miss(owner_id, note_id, "pin").await?),
        }
    }

    async fn get_all_notes(&self, owner_id: i64) -> Result<Vec<NoteModel>> {
        self.get_notes(owner_id, false).await
    }

    async fn get_pinned_notes(&self, owner_id: i64) -> Result<Vec<NoteModel>> {
        self.get_notes(owner_id, true).await
    }
}

impl CoreNoteService {
    async fn get_notes(&self, owner_id: i64, pinned_only: bool) -> Result<Vec<NoteModel>> {
        let notes = self.data_layer.get_notes(owner_id, pinned_only).await?;

        if notes.is_empty() {
            return Err(NoteServiceError::NoNotesFound);
        }
        Ok(notes.into_iter().map(NoteModel::from).collect())
    }

    ///
    /// An owner-scoped mutation matched nothing. Determines whether that's
    /// because the note doesn't exist, or because it belongs to someone else
    ///
    async fn explain_miss(&self, owner_id: i64, note_id: i64, action: &'static str) -> Result<NoteServiceError> {
        if !self.data_layer.note_exists(note_id).await? {
            return Ok(NoteServiceError::NoteNotFound);
        }
        warn!("User {owner_id} attempted to {action} note {note_id} they don't own");
        Ok(NoteServiceError::NotNoteOwner(action))
    }
}

///
/// Title and content must both be non-empty once trimmed. The title is stored trimmed
///
fn required_fields(dto: &NoteDto) -> Result<(&str, &str)> {
    let title = dto.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let content = dto.content.as_deref().filter(|c| !c.trim().is_empty());

    match (title, content) {
        (Some(title), Some(content)) => Ok((title, content)),
        _ => Err(NoteServiceError::MissingFields),
    }
}
