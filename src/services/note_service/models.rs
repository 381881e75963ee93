use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::data_layer::entities::NoteEntity;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteModel {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub owner: i64,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteEntity> for NoteModel {
    fn from(note: NoteEntity) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            owner: note.owner_id,
            is_pinned: note.is_pinned,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

///
/// Result of toggling a note's pinned state
///
#[derive(Debug, PartialEq)]
pub struct PinResultModel {
    pub note: NoteModel,
}

impl PinResultModel {
    pub fn message(&self) -> &'static str {
        if self.note.is_pinned {
            "Note pinned successfully"
        } else {
            "Note unpinned successfully"
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteDto {
    pub title: Option<String>,
    pub content: Option<String>,
}
