//! Publishing workflow: manual publish/unpublish/schedule and the due-page sweep.
//!
//! Transitions are computed by [`PublishState`] in `pagecraft-core`; this
//! module loads the page, applies the transition and persists the result.

use pagecraft_core::error::CoreError;
use pagecraft_core::publishing::PublishState;
use pagecraft_core::types::{DbId, Timestamp};
use pagecraft_db::models::page::Page;
use pagecraft_db::{PageStore, StoreError};

use crate::error::{AppError, AppResult};

/// Outcome of one scheduler sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Pages moved to `published`.
    pub published: usize,
    /// Pages that stopped being due between the query and the write.
    pub skipped: usize,
    /// Pages whose write failed.
    pub failed: usize,
}

async fn load_page(pages: &dyn PageStore, page_id: DbId) -> AppResult<Page> {
    pages
        .find_page(page_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Page",
            id: page_id,
        }))
}

async fn persist(pages: &dyn PageStore, page_id: DbId, next: &PublishState) -> AppResult<Page> {
    next.check_invariants()?;
    pages
        .save_publish_state(page_id, next)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Page",
            id: page_id,
        }))
}

/// Publish now. Republishing keeps the original `published_at`.
pub async fn publish(pages: &dyn PageStore, page_id: DbId, now: Timestamp) -> AppResult<Page> {
    let page = load_page(pages, page_id).await?;
    let next = page.publish_state().publish(now);
    let page = persist(pages, page_id, &next).await?;
    tracing::info!(page_id, "Page published");
    Ok(page)
}

/// Back to draft. A pending schedule stays armed.
pub async fn unpublish(pages: &dyn PageStore, page_id: DbId) -> AppResult<Page> {
    let page = load_page(pages, page_id).await?;
    let next = page.publish_state().unpublish();
    let page = persist(pages, page_id, &next).await?;
    tracing::info!(page_id, "Page moved to draft");
    Ok(page)
}

/// Arm the page for automatic publishing at `at` (must be after `now`).
pub async fn schedule(
    pages: &dyn PageStore,
    page_id: DbId,
    at: Timestamp,
    now: Timestamp,
) -> AppResult<Page> {
    let page = load_page(pages, page_id).await?;
    let next = page.publish_state().schedule(at, now)?;
    let page = persist(pages, page_id, &next).await?;
    tracing::info!(page_id, scheduled_at = %at, "Page scheduled");
    Ok(page)
}

/// Publish up to `limit` drafts whose schedule is due at `now`.
///
/// Each page is handled on its own: a failed write is logged and counted,
/// and the sweep moves on. Only the initial query can fail the sweep.
pub async fn publish_due_pages(
    pages: &dyn PageStore,
    now: Timestamp,
    limit: i64,
) -> Result<SweepReport, StoreError> {
    let due = pages.list_due_scheduled(now, limit).await?;
    let mut report = SweepReport::default();

    for page in &due {
        let next = page.publish_state().auto_publish(now);
        match pages.publish_if_due(page.id, &next, now).await {
            Ok(Some(_)) => {
                report.published += 1;
                tracing::info!(
                    page_id = page.id,
                    scheduled_at = ?page.scheduled_at,
                    "Scheduled page published"
                );
            }
            Ok(None) => {
                report.skipped += 1;
                tracing::debug!(page_id = page.id, "Scheduled page no longer due, skipped");
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(page_id = page.id, error = %e, "Failed to publish scheduled page");
            }
        }
    }

    Ok(report)
}
