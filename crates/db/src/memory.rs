//! In-process [`PageStore`] / [`VersionStore`] for tests and local tooling.
//!
//! All state sits behind one async mutex, so each trait call is atomic in the
//! same way the PostgreSQL transactions are: version numbering, the cursor
//! advance on append, and the guarded scheduler write cannot interleave.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use pagecraft_core::block::Block;
use pagecraft_core::history::{HistoryCursor, SaveType};
use pagecraft_core::publishing::{PageStatus, PublishState};
use pagecraft_core::types::{DbId, Timestamp, VersionNumber};
use sqlx::types::Json;
use tokio::sync::Mutex;

use crate::models::page::{CreatePage, Page, UpdatePage};
use crate::models::page_version::{CreatePageVersion, PageVersion, VersionSummary};
use crate::store::{PageStore, StoreError, VersionStore};

#[derive(Default)]
struct MemoryState {
    pages: BTreeMap<DbId, Page>,
    versions: BTreeMap<DbId, PageVersion>,
    next_page_id: DbId,
    next_version_id: DbId,
}

impl MemoryState {
    fn slug_taken(&self, slug: &str, except: Option<DbId>) -> bool {
        self.pages
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    fn page_mut(&mut self, id: DbId) -> Option<&mut Page> {
        self.pages.get_mut(&id)
    }
}

fn slug_conflict() -> StoreError {
    StoreError::Conflict("Duplicate value violates unique constraint: uq_pages_slug".into())
}

fn apply_publish_state(page: &mut Page, state: &PublishState) {
    page.status = state.status;
    page.published_at = state.published_at;
    page.scheduled_at = state.scheduled_at;
    page.updated_at = Utc::now();
}

/// Shared, cloneable in-memory store. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_page(&self, input: &CreatePage) -> Result<Page, StoreError> {
        let mut state = self.state.lock().await;
        if state.slug_taken(&input.slug, None) {
            return Err(slug_conflict());
        }
        state.next_page_id += 1;
        let now = Utc::now();
        let page = Page {
            id: state.next_page_id,
            slug: input.slug.clone(),
            title: input.title.clone(),
            blocks: Json(input.blocks.clone()),
            status: PageStatus::Draft,
            published_at: None,
            scheduled_at: None,
            current_version: 0,
            redo_stack: Vec::new(),
            meta_title: input.meta_title.clone(),
            meta_description: input.meta_description.clone(),
            meta_keywords: input.meta_keywords.clone(),
            og_image: input.og_image.clone(),
            featured_image: input.featured_image.clone(),
            author_id: input.author_id,
            created_at: now,
            updated_at: now,
        };
        state.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn find_page(&self, id: DbId) -> Result<Option<Page>, StoreError> {
        Ok(self.state.lock().await.pages.get(&id).cloned())
    }

    async fn update_page(&self, id: DbId, input: &UpdatePage) -> Result<Option<Page>, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(slug) = &input.slug {
            if state.pages.contains_key(&id) && state.slug_taken(slug, Some(id)) {
                return Err(slug_conflict());
            }
        }
        let Some(page) = state.page_mut(id) else {
            return Ok(None);
        };
        if let Some(slug) = &input.slug {
            page.slug = slug.clone();
        }
        if let Some(title) = &input.title {
            page.title = title.clone();
        }
        if let Some(blocks) = &input.blocks {
            page.blocks = Json(blocks.clone());
        }
        if let Some(v) = &input.meta_title {
            page.meta_title = Some(v.clone());
        }
        if let Some(v) = &input.meta_description {
            page.meta_description = Some(v.clone());
        }
        if let Some(v) = &input.meta_keywords {
            page.meta_keywords = v.clone();
        }
        if let Some(v) = &input.og_image {
            page.og_image = Some(v.clone());
        }
        if let Some(v) = &input.featured_image {
            page.featured_image = Some(v.clone());
        }
        page.updated_at = Utc::now();
        Ok(Some(page.clone()))
    }

    async fn save_history(
        &self,
        id: DbId,
        blocks: &[Block],
        cursor: &HistoryCursor,
    ) -> Result<Option<Page>, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.page_mut(id).map(|page| {
            page.blocks = Json(blocks.to_vec());
            page.current_version = cursor.current_version;
            page.redo_stack = cursor.redo_stack.clone();
            page.updated_at = Utc::now();
            page.clone()
        }))
    }

    async fn replace_blocks(&self, id: DbId, blocks: &[Block]) -> Result<Option<Page>, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.page_mut(id).map(|page| {
            page.blocks = Json(blocks.to_vec());
            page.updated_at = Utc::now();
            page.clone()
        }))
    }

    async fn save_publish_state(
        &self,
        id: DbId,
        publish: &PublishState,
    ) -> Result<Option<Page>, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.page_mut(id).map(|page| {
            apply_publish_state(page, publish);
            page.clone()
        }))
    }

    async fn publish_if_due(
        &self,
        id: DbId,
        next: &PublishState,
        now: Timestamp,
    ) -> Result<Option<Page>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(page) = state.page_mut(id) else {
            return Ok(None);
        };
        if !page.publish_state().is_due(now) {
            return Ok(None);
        }
        apply_publish_state(page, next);
        Ok(Some(page.clone()))
    }

    async fn delete_page(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let removed = state.pages.remove(&id).is_some();
        if removed {
            // Mirrors ON DELETE CASCADE.
            state.versions.retain(|_, v| v.page_id != id);
        }
        Ok(removed)
    }

    async fn list_due_scheduled(
        &self,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<Page>, StoreError> {
        let state = self.state.lock().await;
        let mut due: Vec<Page> = state
            .pages
            .values()
            .filter(|p| p.publish_state().is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|p| (p.scheduled_at, p.id));
        due.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(due)
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn append_version(
        &self,
        input: &CreatePageVersion,
    ) -> Result<Option<PageVersion>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(current_version) = state.pages.get(&input.page_id).map(|p| p.current_version)
        else {
            return Ok(None);
        };

        let next: VersionNumber = state
            .versions
            .values()
            .filter(|v| v.page_id == input.page_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            .max(current_version)
            + 1;

        state.next_version_id += 1;
        let version = PageVersion {
            id: state.next_version_id,
            page_id: input.page_id,
            version_number: next,
            blocks: Json(input.blocks.clone()),
            save_type: input.save_type,
            saved_by: input.saved_by,
            note: input.note.clone(),
            parent_version: HistoryCursor::new(current_version, Vec::new()).parent_for_next(),
            created_at: Utc::now(),
        };
        state.versions.insert(version.id, version.clone());

        if let Some(page) = state.page_mut(input.page_id) {
            page.current_version = next;
            page.redo_stack.clear();
        }
        Ok(Some(version))
    }

    fn history(
        &self,
        page_id: DbId,
        save_type: Option<SaveType>,
    ) -> BoxStream<'_, Result<VersionSummary, StoreError>> {
        let snapshot = async move {
            let state = self.state.lock().await;
            let mut rows: Vec<VersionSummary> = state
                .versions
                .values()
                .filter(|v| v.page_id == page_id)
                .filter(|v| save_type.map_or(true, |t| v.save_type == t))
                .map(VersionSummary::from)
                .collect();
            rows.sort_by(|a, b| b.version_number.cmp(&a.version_number));
            stream::iter(rows.into_iter().map(Ok))
        };
        stream::once(snapshot).flatten().boxed()
    }

    async fn find_version(&self, id: DbId) -> Result<Option<PageVersion>, StoreError> {
        Ok(self.state.lock().await.versions.get(&id).cloned())
    }

    async fn find_by_number(
        &self,
        page_id: DbId,
        version_number: VersionNumber,
    ) -> Result<Option<PageVersion>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .versions
            .values()
            .find(|v| v.page_id == page_id && v.version_number == version_number)
            .cloned())
    }

    async fn delete_version(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.versions.remove(&id).is_some())
    }

    async fn delete_all_for_page(&self, page_id: DbId) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.versions.len();
        state.versions.retain(|_, v| v.page_id != page_id);
        Ok((before - state.versions.len()) as u64)
    }
}
