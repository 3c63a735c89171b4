//! Page entity model and DTOs.

use pagecraft_core::block::Block;
use pagecraft_core::history::HistoryCursor;
use pagecraft_core::publishing::{PageStatus, PublishPhase, PublishState};
use pagecraft_core::types::{DbId, Timestamp, VersionNumber};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `pages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub blocks: Json<Vec<Block>>,
    #[sqlx(try_from = "String")]
    pub status: PageStatus,
    pub published_at: Option<Timestamp>,
    pub scheduled_at: Option<Timestamp>,
    pub current_version: VersionNumber,
    pub redo_stack: Vec<VersionNumber>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Vec<String>,
    pub og_image: Option<String>,
    pub featured_image: Option<String>,
    pub author_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Page {
    pub fn publish_state(&self) -> PublishState {
        PublishState {
            status: self.status,
            published_at: self.published_at,
            scheduled_at: self.scheduled_at,
        }
    }

    pub fn phase(&self) -> PublishPhase {
        self.publish_state().phase()
    }

    pub fn cursor(&self) -> HistoryCursor {
        HistoryCursor::new(self.current_version, self.redo_stack.clone())
    }
}

/// Input for creating a draft page.
#[derive(Debug, Clone)]
pub struct CreatePage {
    pub slug: String,
    pub title: String,
    pub blocks: Vec<Block>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Vec<String>,
    pub og_image: Option<String>,
    pub featured_image: Option<String>,
    pub author_id: Option<DbId>,
}

/// Partial page update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdatePage {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub blocks: Option<Vec<Block>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<Vec<String>>,
    pub og_image: Option<String>,
    pub featured_image: Option<String>,
}

impl UpdatePage {
    /// Whether this update replaces the page content (and so needs a snapshot).
    pub fn touches_content(&self) -> bool {
        self.blocks.is_some()
    }
}
