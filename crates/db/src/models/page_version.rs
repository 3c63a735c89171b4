//! Page version (snapshot) entity model and DTOs.

use pagecraft_core::block::Block;
use pagecraft_core::history::SaveType;
use pagecraft_core::types::{DbId, Timestamp, VersionNumber};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `page_versions` table. Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVersion {
    pub id: DbId,
    pub page_id: DbId,
    pub version_number: VersionNumber,
    pub blocks: Json<Vec<Block>>,
    #[sqlx(try_from = "String")]
    pub save_type: SaveType,
    pub saved_by: Option<DbId>,
    pub note: Option<String>,
    /// Page cursor at capture time; `None` for the first snapshot.
    pub parent_version: Option<VersionNumber>,
    pub created_at: Timestamp,
}

/// History-list projection of a version, without the block payload.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: DbId,
    pub version_number: VersionNumber,
    #[sqlx(try_from = "String")]
    pub save_type: SaveType,
    pub saved_by: Option<DbId>,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

impl From<&PageVersion> for VersionSummary {
    fn from(v: &PageVersion) -> Self {
        Self {
            id: v.id,
            version_number: v.version_number,
            save_type: v.save_type,
            saved_by: v.saved_by,
            note: v.note.clone(),
            created_at: v.created_at,
        }
    }
}

/// Input for appending a snapshot. The version number is assigned by the store.
#[derive(Debug, Clone)]
pub struct CreatePageVersion {
    pub page_id: DbId,
    pub blocks: Vec<Block>,
    pub saved_by: Option<DbId>,
    pub save_type: SaveType,
    pub note: Option<String>,
}
