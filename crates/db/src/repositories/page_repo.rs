//! Repository for the `pages` table.

use pagecraft_core::block::Block;
use pagecraft_core::history::HistoryCursor;
use pagecraft_core::publishing::PublishState;
use pagecraft_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::page::{CreatePage, Page, UpdatePage};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slug, title, blocks, status, published_at, scheduled_at, \
    current_version, redo_stack, meta_title, meta_description, meta_keywords, \
    og_image, featured_image, author_id, created_at, updated_at";

/// Provides CRUD, history-cursor and publishing writes for pages.
pub struct PageRepo;

impl PageRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a new draft page with no version history.
    pub async fn create(pool: &PgPool, input: &CreatePage) -> Result<Page, sqlx::Error> {
        let query = format!(
            "INSERT INTO pages
                (slug, title, blocks, meta_title, meta_description, meta_keywords,
                 og_image, featured_image, author_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(&input.slug)
            .bind(&input.title)
            .bind(Json(&input.blocks))
            .bind(&input.meta_title)
            .bind(&input.meta_description)
            .bind(&input.meta_keywords)
            .bind(&input.og_image)
            .bind(&input.featured_image)
            .bind(input.author_id)
            .fetch_one(pool)
            .await
    }

    /// Find a page by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a page. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePage,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!(
            "UPDATE pages SET
                slug = COALESCE($2, slug),
                title = COALESCE($3, title),
                blocks = COALESCE($4, blocks),
                meta_title = COALESCE($5, meta_title),
                meta_description = COALESCE($6, meta_description),
                meta_keywords = COALESCE($7, meta_keywords),
                og_image = COALESCE($8, og_image),
                featured_image = COALESCE($9, featured_image)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(&input.slug)
            .bind(&input.title)
            .bind(input.blocks.as_ref().map(Json))
            .bind(&input.meta_title)
            .bind(&input.meta_description)
            .bind(input.meta_keywords.as_deref())
            .bind(&input.og_image)
            .bind(&input.featured_image)
            .fetch_optional(pool)
            .await
    }

    /// Delete a page. Its versions go with it via `ON DELETE CASCADE`.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Content and history cursor ───────────────────────────────────

    /// Overwrite the live blocks without moving the history cursor.
    pub async fn replace_blocks(
        pool: &PgPool,
        id: DbId,
        blocks: &[Block],
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("UPDATE pages SET blocks = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(Json(blocks))
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the live blocks and move the history cursor in one write.
    pub async fn save_history(
        pool: &PgPool,
        id: DbId,
        blocks: &[Block],
        cursor: &HistoryCursor,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!(
            "UPDATE pages SET blocks = $2, current_version = $3, redo_stack = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(Json(blocks))
            .bind(cursor.current_version)
            .bind(&cursor.redo_stack)
            .fetch_optional(pool)
            .await
    }

    // ── Publishing ───────────────────────────────────────────────────

    /// Persist the publishing fields computed by the state machine.
    pub async fn save_publish_state(
        pool: &PgPool,
        id: DbId,
        state: &PublishState,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!(
            "UPDATE pages SET status = $2, published_at = $3, scheduled_at = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(state.status.as_str())
            .bind(state.published_at)
            .bind(state.scheduled_at)
            .fetch_optional(pool)
            .await
    }

    /// Apply `next` only if the page is still a draft whose schedule is due at `now`.
    ///
    /// Returns `None` when the guard no longer matches (published, unscheduled
    /// or rescheduled since the sweep query ran).
    pub async fn publish_if_due(
        pool: &PgPool,
        id: DbId,
        next: &PublishState,
        now: Timestamp,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!(
            "UPDATE pages SET status = $2, published_at = $3, scheduled_at = $4
             WHERE id = $1
               AND status = 'draft'
               AND scheduled_at IS NOT NULL
               AND scheduled_at <= $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(next.status.as_str())
            .bind(next.published_at)
            .bind(next.scheduled_at)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Drafts whose schedule is due, oldest schedule first, at most `limit` rows.
    pub async fn list_due_scheduled(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<Page>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pages
             WHERE status = 'draft'
               AND scheduled_at IS NOT NULL
               AND scheduled_at <= $1
             ORDER BY scheduled_at ASC, id ASC
             LIMIT $2"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
