pub mod entities;

use axum::async_trait;
use chrono::Utc;
use derive_more::Constructor;
use sqlx::SqlitePool;

use crate::data_layer_error::Result;

use self::entities::NoteEntity;

const NOTE_COLUMNS: &str = "id, owner_id, title, content, is_pinned, created_at, updated_at";

///
/// Persistence for notes. Every mutation is scoped to the note's owner:
/// it only takes effect when both `id` and `owner_id` match.
///
#[async_trait]
pub trait NoteDataLayer : Send + Sync {
    ///
    /// Inserts a new note, and returns its ID
    ///
    async fn create_note<'a>(&self, owner_id: i64, title: &'a str, content: &'a str) -> Result<i64>;
    async fn get_note_by_id(&self, id: i64) -> Result<Option<NoteEntity>>;
    async fn note_exists(&self, id: i64) -> Result<bool>;
    ///
    /// Replaces the title and content of the owner's note.
    /// Returns `None` if no note with `id` belongs to `owner_id`
    ///
    async fn update_note<'a>(&self, id: i64, owner_id: i64, title: &'a str, content: &'a str) -> Result<Option<NoteEntity>>;
    ///
    /// Flips the pinned state of the owner's note.
    /// Returns `None` if no note with `id` belongs to `owner_id`
    ///
    async fn toggle_pin(&self, id: i64, owner_id: i64) -> Result<Option<NoteEntity>>;
    ///
    /// Deletes the owner's note. Returns `false` if no note with `id` belongs to `owner_id`
    ///
    async fn delete_note(&self, id: i64, owner_id: i64) -> Result<bool>;
    ///
    /// All notes of the owner (or only the pinned ones), newest first
    ///
    async fn get_notes(&self, owner_id: i64, pinned_only: bool) -> Result<Vec<NoteEntity>>;
}

#[derive(Constructor)]
pub struct DbNoteDataLayer {
    db: SqlitePool,
}

#[async_trait]
impl NoteDataLayer for DbNoteDataLayer {
    async fn create_note<'a>(&self, owner_id: i64, title: &'a str, content: &'a str) -> Result<i64> {
        let now = Utc::now();
        let res = sqlx::query("
            INSERT INTO notes (owner_id, title, content, is_pinned, created_at, updated_at)
            VALUES (?, ?, ?, FALSE, ?, ?)
            ")
            .bind(owner_id)
            .bind(title)
            .bind(content)
            .bind(now)
            .bind(now)
            .execute(&self.db).await?;

        Ok(res.last_insert_rowid())
    }

    async fn get_note_by_id(&self, id: i64) -> Result<Option<NoteEntity>> {
        let note = sqlx::query_as::<_, NoteEntity>(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?")
        )
            .bind(id)
            .fetch_optional(&self.db).await?;

        Ok(note)
    }

    async fn note_exists(&self, id: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db).await?;

        Ok(row.is_some())
    }

    async fn update_note<'a>(&self, id: i64, owner_id: i64, title: &'a str, content: &'a str) -> Result<Option<NoteEntity>> {
        let note = sqlx::query_as::<_, NoteEntity>(&format!("
            UPDATE notes SET title = ?, content = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            RETURNING {NOTE_COLUMNS}
            "))
            .bind(title)
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db).await?;

        Ok(note)
    }

    async fn toggle_pin(&self, id: i64, owner_id: i64) -> Result<Option<NoteEntity>> {
        let note = sqlx::query_as::<_, NoteEntity>(&format!("
            UPDATE notes SET is_pinned = NOT is_pinned, updated_at = ?
            WHERE id = ? AND owner_id = ?
            RETURNING {NOTE_COLUMNS}
            "))
            .bind(Utc::now())
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db).await?;

        Ok(note)
    }

    async fn delete_note(&self, id: i64, owner_id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM notes WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db).await?;

        Ok(res.rows_affected() == 1)
    }

    async fn get_notes(&self, owner_id: i64, pinned_only: bool) -> Result<Vec<NoteEntity>> {
        let notes = sqlx::query_as::<_, NoteEntity>(&format!("
            SELECT {NOTE_COLUMNS} FROM notes
            WHERE owner_id = ? AND (is_pinned = TRUE OR ? = FALSE)
            ORDER BY created_at DESC, id DESC
            "))
            .bind(owner_id)
            .bind(pinned_only)
            .fetch_all(&self.db).await?;

        Ok(notes)
    }
}
