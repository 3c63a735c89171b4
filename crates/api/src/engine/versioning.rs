//! Version history engine: snapshots, autosave, undo/redo and restore.
//!
//! Snapshot writes that happen as a side effect of another request
//! ([`VersionEngine::create_version`], [`VersionEngine::autosave`],
//! [`VersionEngine::delete_all_versions`]) are best-effort: failures are
//! logged and never reach the caller. Everything else returns [`AppResult`].
//!
//! Undo/redo read the page cursor and write it back without holding a lock
//! across the two calls; two concurrent undos on one page are last-writer-wins.

use futures::stream::BoxStream;
use pagecraft_core::block::Block;
use pagecraft_core::error::CoreError;
use pagecraft_core::history::{HistoryCursor, HistoryStep, SaveType};
use pagecraft_core::types::{DbId, VersionNumber};
use pagecraft_db::models::page::Page;
use pagecraft_db::models::page_version::{CreatePageVersion, PageVersion, VersionSummary};
use pagecraft_db::{PageStore, StoreError, VersionStore};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Live page content after an undo or redo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMove {
    pub current_version: VersionNumber,
    pub blocks: Vec<Block>,
}

impl From<Page> for HistoryMove {
    fn from(page: Page) -> Self {
        Self {
            current_version: page.current_version,
            blocks: page.blocks.0,
        }
    }
}

/// Borrowed view over the two stores.
#[derive(Clone, Copy)]
pub struct VersionEngine<'a> {
    pages: &'a dyn PageStore,
    versions: &'a dyn VersionStore,
}

fn page_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Page", id })
}

fn version_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "PageVersion",
        id,
    })
}

impl<'a> VersionEngine<'a> {
    pub fn new(pages: &'a dyn PageStore, versions: &'a dyn VersionStore) -> Self {
        Self { pages, versions }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(state.pages.as_ref(), state.versions.as_ref())
    }

    // ── Version store ────────────────────────────────────────────────

    /// Append a snapshot. Never fails the caller.
    ///
    /// Returns the stored version, or `None` if the page is gone or the
    /// write failed (both logged).
    pub async fn create_version(&self, input: &CreatePageVersion) -> Option<PageVersion> {
        match self.versions.append_version(input).await {
            Ok(Some(version)) => {
                tracing::debug!(
                    page_id = input.page_id,
                    version_number = version.version_number,
                    save_type = %input.save_type,
                    "Page snapshot stored"
                );
                Some(version)
            }
            Ok(None) => {
                tracing::warn!(page_id = input.page_id, "Snapshot skipped: page not found");
                None
            }
            Err(e) => {
                tracing::error!(page_id = input.page_id, error = %e, "Failed to store page snapshot");
                None
            }
        }
    }

    /// Snapshot the page's live blocks after a content update.
    ///
    /// Runs after the page write has succeeded and is awaited so snapshots
    /// keep the order of the updates that produced them. Unchanged blocks
    /// still produce a new version.
    pub async fn autosave(&self, page: &Page, saved_by: Option<DbId>) -> Option<PageVersion> {
        self.create_version(&CreatePageVersion {
            page_id: page.id,
            blocks: page.blocks.0.clone(),
            saved_by,
            save_type: SaveType::Auto,
            note: None,
        })
        .await
    }

    /// Explicitly requested snapshot of the live blocks (`save_type = manual`).
    pub async fn snapshot(
        &self,
        page_id: DbId,
        saved_by: Option<DbId>,
        note: Option<String>,
    ) -> AppResult<PageVersion> {
        let page = self.load_page(page_id).await?;
        let input = CreatePageVersion {
            page_id,
            blocks: page.blocks.0,
            saved_by,
            save_type: SaveType::Manual,
            note,
        };
        self.versions
            .append_version(&input)
            .await?
            .ok_or_else(|| page_not_found(page_id))
    }

    /// Lazily stream a page's history, most recent first.
    ///
    /// An unknown page simply yields an empty stream.
    pub fn history(
        &self,
        page_id: DbId,
        save_type: Option<SaveType>,
    ) -> BoxStream<'a, Result<VersionSummary, StoreError>> {
        let versions = self.versions;
        versions.history(page_id, save_type)
    }

    pub async fn get_version(&self, version_id: DbId) -> AppResult<PageVersion> {
        self.versions
            .find_version(version_id)
            .await?
            .ok_or_else(|| version_not_found(version_id))
    }

    /// Delete exactly one version. Later versions keep their numbers.
    pub async fn delete_version(&self, version_id: DbId) -> AppResult<()> {
        if !self.versions.delete_version(version_id).await? {
            return Err(version_not_found(version_id));
        }
        tracing::info!(version_id, "Page version deleted");
        Ok(())
    }

    /// Remove every version of a page. Never fails the caller.
    pub async fn delete_all_versions(&self, page_id: DbId) {
        match self.versions.delete_all_for_page(page_id).await {
            Ok(deleted) => tracing::debug!(page_id, deleted, "Page versions removed"),
            Err(e) => tracing::error!(page_id, error = %e, "Failed to remove page versions"),
        }
    }

    // ── Undo / redo / restore ────────────────────────────────────────

    /// Step back to the current snapshot's parent.
    pub async fn undo(&self, page_id: DbId) -> AppResult<HistoryMove> {
        let page = self.load_page(page_id).await?;
        let cursor = page.cursor();

        let parent = if cursor.current_version > 1 {
            self.parent_of(page_id, &cursor).await?
        } else {
            None
        };

        let step = cursor.plan_undo(parent)?;
        self.apply(page_id, step, "Previous").await
    }

    /// Step forward to the most recently undone snapshot.
    pub async fn redo(&self, page_id: DbId) -> AppResult<HistoryMove> {
        let page = self.load_page(page_id).await?;
        let step = page.cursor().plan_redo()?;
        self.apply(page_id, step, "Redo").await
    }

    /// Copy a version's blocks onto its page.
    ///
    /// The history cursor is left where it is, so a later undo still steps
    /// from the pre-restore position.
    pub async fn restore(&self, version_id: DbId) -> AppResult<Page> {
        let version = self.get_version(version_id).await?;
        let page = self
            .pages
            .replace_blocks(version.page_id, &version.blocks.0)
            .await?
            .ok_or_else(|| page_not_found(version.page_id))?;

        tracing::info!(
            page_id = page.id,
            version_number = version.version_number,
            "Version restored"
        );
        Ok(page)
    }

    // ── Helpers ──────────────────────────────────────────────────────

    async fn load_page(&self, page_id: DbId) -> AppResult<Page> {
        self.pages
            .find_page(page_id)
            .await?
            .ok_or_else(|| page_not_found(page_id))
    }

    /// Parent recorded on the current snapshot.
    ///
    /// If that row has been deleted the linear predecessor is assumed.
    async fn parent_of(
        &self,
        page_id: DbId,
        cursor: &HistoryCursor,
    ) -> AppResult<Option<VersionNumber>> {
        let current = self
            .versions
            .find_by_number(page_id, cursor.current_version)
            .await?;
        Ok(match current {
            Some(version) => version.parent_version,
            None => {
                tracing::warn!(
                    page_id,
                    current_version = cursor.current_version,
                    "Current version row missing, assuming linear parent"
                );
                Some(cursor.current_version - 1)
            }
        })
    }

    async fn apply(&self, page_id: DbId, step: HistoryStep, label: &str) -> AppResult<HistoryMove> {
        let target = self
            .versions
            .find_by_number(page_id, step.target)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::InternalConsistency(format!(
                    "{label} version {} of page {page_id} not found",
                    step.target
                )))
            })?;

        let page = self
            .pages
            .save_history(page_id, &target.blocks.0, &step.cursor)
            .await?
            .ok_or_else(|| page_not_found(page_id))?;

        tracing::info!(
            page_id,
            current_version = page.current_version,
            redo_depth = page.redo_stack.len(),
            "Page history moved"
        );
        Ok(HistoryMove::from(page))
    }
}
