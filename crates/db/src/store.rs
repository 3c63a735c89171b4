//! Storage seam between the API services and the database.
//!
//! Services hold `Arc<dyn PageStore>` / `Arc<dyn VersionStore>` so the same
//! versioning and publishing code runs against PostgreSQL ([`PgStore`]) in
//! production and against [`MemoryStore`](crate::MemoryStore) in tests.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use pagecraft_core::block::Block;
use pagecraft_core::history::{HistoryCursor, SaveType};
use pagecraft_core::publishing::PublishState;
use pagecraft_core::types::{DbId, Timestamp, VersionNumber};

use crate::models::page::{CreatePage, Page, UpdatePage};
use crate::models::page_version::{CreatePageVersion, PageVersion, VersionSummary};
use crate::repositories::{PageRepo, PageVersionRepo};
use crate::DbPool;

/// Failure reported by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule was violated (the in-memory twin of a `uq_*` constraint).
    #[error("{0}")]
    Conflict(String),
}

/// Page documents: content, history cursor and publishing fields.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn create_page(&self, input: &CreatePage) -> Result<Page, StoreError>;

    async fn find_page(&self, id: DbId) -> Result<Option<Page>, StoreError>;

    async fn update_page(&self, id: DbId, input: &UpdatePage) -> Result<Option<Page>, StoreError>;

    /// Overwrite the live blocks and the history cursor together.
    async fn save_history(
        &self,
        id: DbId,
        blocks: &[Block],
        cursor: &HistoryCursor,
    ) -> Result<Option<Page>, StoreError>;

    /// Overwrite the live blocks, leaving the cursor untouched.
    async fn replace_blocks(&self, id: DbId, blocks: &[Block]) -> Result<Option<Page>, StoreError>;

    async fn save_publish_state(
        &self,
        id: DbId,
        state: &PublishState,
    ) -> Result<Option<Page>, StoreError>;

    /// Guarded scheduler write: applies `next` only while the page is still a due draft.
    async fn publish_if_due(
        &self,
        id: DbId,
        next: &PublishState,
        now: Timestamp,
    ) -> Result<Option<Page>, StoreError>;

    async fn delete_page(&self, id: DbId) -> Result<bool, StoreError>;

    async fn list_due_scheduled(&self, now: Timestamp, limit: i64)
        -> Result<Vec<Page>, StoreError>;
}

/// Append-only page snapshots.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Append a snapshot numbered past both the stored maximum and the page
    /// cursor, and advance the cursor to it.
    ///
    /// Returns `None` if the page does not exist.
    async fn append_version(
        &self,
        input: &CreatePageVersion,
    ) -> Result<Option<PageVersion>, StoreError>;

    /// Lazily stream a page's history, most recent first.
    fn history(
        &self,
        page_id: DbId,
        save_type: Option<SaveType>,
    ) -> BoxStream<'_, Result<VersionSummary, StoreError>>;

    async fn find_version(&self, id: DbId) -> Result<Option<PageVersion>, StoreError>;

    async fn find_by_number(
        &self,
        page_id: DbId,
        version_number: VersionNumber,
    ) -> Result<Option<PageVersion>, StoreError>;

    async fn delete_version(&self, id: DbId) -> Result<bool, StoreError>;

    async fn delete_all_for_page(&self, page_id: DbId) -> Result<u64, StoreError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`PageStore`] and [`VersionStore`] backed by the repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl PageStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn create_page(&self, input: &CreatePage) -> Result<Page, StoreError> {
        Ok(PageRepo::create(&self.pool, input).await?)
    }

    async fn find_page(&self, id: DbId) -> Result<Option<Page>, StoreError> {
        Ok(PageRepo::find_by_id(&self.pool, id).await?)
    }

    async fn update_page(&self, id: DbId, input: &UpdatePage) -> Result<Option<Page>, StoreError> {
        Ok(PageRepo::update(&self.pool, id, input).await?)
    }

    async fn save_history(
        &self,
        id: DbId,
        blocks: &[Block],
        cursor: &HistoryCursor,
    ) -> Result<Option<Page>, StoreError> {
        Ok(PageRepo::save_history(&self.pool, id, blocks, cursor).await?)
    }

    async fn replace_blocks(&self, id: DbId, blocks: &[Block]) -> Result<Option<Page>, StoreError> {
        Ok(PageRepo::replace_blocks(&self.pool, id, blocks).await?)
    }

    async fn save_publish_state(
        &self,
        id: DbId,
        state: &PublishState,
    ) -> Result<Option<Page>, StoreError> {
        Ok(PageRepo::save_publish_state(&self.pool, id, state).await?)
    }

    async fn publish_if_due(
        &self,
        id: DbId,
        next: &PublishState,
        now: Timestamp,
    ) -> Result<Option<Page>, StoreError> {
        Ok(PageRepo::publish_if_due(&self.pool, id, next, now).await?)
    }

    async fn delete_page(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(PageRepo::delete(&self.pool, id).await?)
    }

    async fn list_due_scheduled(
        &self,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<Page>, StoreError> {
        Ok(PageRepo::list_due_scheduled(&self.pool, now, limit).await?)
    }
}

#[async_trait]
impl VersionStore for PgStore {
    async fn append_version(
        &self,
        input: &CreatePageVersion,
    ) -> Result<Option<PageVersion>, StoreError> {
        Ok(PageVersionRepo::append(&self.pool, input).await?)
    }

    fn history(
        &self,
        page_id: DbId,
        save_type: Option<SaveType>,
    ) -> BoxStream<'_, Result<VersionSummary, StoreError>> {
        PageVersionRepo::history(&self.pool, page_id, save_type)
            .map_err(StoreError::from)
            .boxed()
    }

    async fn find_version(&self, id: DbId) -> Result<Option<PageVersion>, StoreError> {
        Ok(PageVersionRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_number(
        &self,
        page_id: DbId,
        version_number: VersionNumber,
    ) -> Result<Option<PageVersion>, StoreError> {
        Ok(PageVersionRepo::find_by_number(&self.pool, page_id, version_number).await?)
    }

    async fn delete_version(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(PageVersionRepo::delete(&self.pool, id).await?)
    }

    async fn delete_all_for_page(&self, page_id: DbId) -> Result<u64, StoreError> {
        Ok(PageVersionRepo::delete_all_for_page(&self.pool, page_id).await?)
    }
}
