//! Repository for the `page_versions` table.

use futures::stream::BoxStream;
use pagecraft_core::history::{HistoryCursor, SaveType};
use pagecraft_core::types::{DbId, VersionNumber};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::page_version::{CreatePageVersion, PageVersion, VersionSummary};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, page_id, version_number, blocks, save_type, saved_by, note, \
    parent_version, created_at";

/// History listing. A literal so the returned stream can borrow it for `'static`.
const HISTORY_QUERY: &str = "SELECT id, version_number, save_type, saved_by, note, created_at \
    FROM page_versions \
    WHERE page_id = $1 AND ($2::text IS NULL OR save_type = $2) \
    ORDER BY version_number DESC";

/// Provides append, lookup and delete operations for page snapshots.
pub struct PageVersionRepo;

impl PageVersionRepo {
    /// Append a snapshot and advance the owning page's history cursor.
    ///
    /// Runs in one transaction holding a row lock on the page, so concurrent
    /// appends for the same page are serialized. The new number is one past
    /// both the highest stored number and the page's cursor, so a deleted
    /// head is never reused. `uq_page_versions_page_number` backs the
    /// numbering.
    ///
    /// Returns `None` if the page does not exist.
    pub async fn append(
        pool: &PgPool,
        input: &CreatePageVersion,
    ) -> Result<Option<PageVersion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(VersionNumber,)> =
            sqlx::query_as("SELECT current_version FROM pages WHERE id = $1 FOR UPDATE")
                .bind(input.page_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((current_version,)) = locked else {
            tx.rollback().await?;
            return Ok(None);
        };

        // Numbers stay above the cursor even when the head row was deleted.
        let (next,): (VersionNumber,) = sqlx::query_as(
            "SELECT GREATEST(COALESCE(MAX(version_number), 0), $2) + 1 \
             FROM page_versions WHERE page_id = $1",
        )
        .bind(input.page_id)
        .bind(current_version)
        .fetch_one(&mut *tx)
        .await?;

        let parent = HistoryCursor::new(current_version, Vec::new()).parent_for_next();

        let query = format!(
            "INSERT INTO page_versions
                (page_id, version_number, blocks, save_type, saved_by, note, parent_version)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let version = sqlx::query_as::<_, PageVersion>(&query)
            .bind(input.page_id)
            .bind(next)
            .bind(Json(&input.blocks))
            .bind(input.save_type.as_str())
            .bind(input.saved_by)
            .bind(&input.note)
            .bind(parent)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE pages SET current_version = $2, redo_stack = '{}' WHERE id = $1")
            .bind(input.page_id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(version))
    }

    /// Stream a page's history, most recent first, optionally filtered by save type.
    ///
    /// Rows are decoded as the caller polls; nothing is buffered up front.
    pub fn history(
        pool: &PgPool,
        page_id: DbId,
        save_type: Option<SaveType>,
    ) -> BoxStream<'_, Result<VersionSummary, sqlx::Error>> {
        sqlx::query_as::<_, VersionSummary>(HISTORY_QUERY)
            .bind(page_id)
            .bind(save_type.map(SaveType::as_str))
            .fetch(pool)
    }

    /// Find a version by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PageVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM page_versions WHERE id = $1");
        sqlx::query_as::<_, PageVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a version by its per-page number.
    pub async fn find_by_number(
        pool: &PgPool,
        page_id: DbId,
        version_number: VersionNumber,
    ) -> Result<Option<PageVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_versions WHERE page_id = $1 AND version_number = $2"
        );
        sqlx::query_as::<_, PageVersion>(&query)
            .bind(page_id)
            .bind(version_number)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete one version. Later numbers are not renumbered.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM page_versions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every version of a page. Returns the number of rows removed.
    pub async fn delete_all_for_page(pool: &PgPool, page_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM page_versions WHERE page_id = $1")
            .bind(page_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
