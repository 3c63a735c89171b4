//! Periodic sweep that publishes scheduled pages once their time arrives.
//!
//! Started once at boot with a [`CancellationToken`]; `main` cancels the
//! token and awaits the task during graceful shutdown, before the database
//! pool is closed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pagecraft_db::PageStore;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::engine::publishing::{self, SweepReport};

/// Background service that promotes due scheduled pages to published.
pub struct ScheduledPublisher {
    pages: Arc<dyn PageStore>,
    config: SchedulerConfig,
}

impl ScheduledPublisher {
    pub fn new(pages: Arc<dyn PageStore>, config: SchedulerConfig) -> Self {
        Self { pages, config }
    }

    /// Run the sweep loop until `cancel` is triggered.
    ///
    /// The first sweep runs immediately. A slow sweep delays the next tick
    /// instead of causing a burst of catch-up sweeps.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            batch_limit = self.config.batch_limit,
            "Scheduled publisher started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduled publisher stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    /// Run one sweep. Failures are logged, never propagated.
    pub async fn sweep(&self) -> Option<SweepReport> {
        let now = Utc::now();
        match publishing::publish_due_pages(self.pages.as_ref(), now, self.config.batch_limit).await
        {
            Ok(report) => {
                if report.published > 0 || report.failed > 0 {
                    tracing::info!(
                        published = report.published,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Scheduled publish sweep finished"
                    );
                } else {
                    tracing::debug!("Scheduled publish sweep: nothing due");
                }
                Some(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled publish sweep failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use pagecraft_core::publishing::{PageStatus, PublishState};
    use pagecraft_db::models::page::CreatePage;
    use pagecraft_db::MemoryStore;

    async fn scheduled_page(store: &MemoryStore, slug: &str) -> i64 {
        let page = store
            .create_page(&CreatePage {
                slug: slug.to_string(),
                title: "Due soon".to_string(),
                blocks: Vec::new(),
                meta_title: None,
                meta_description: None,
                meta_keywords: Vec::new(),
                og_image: None,
                featured_image: None,
                author_id: None,
            })
            .await
            .unwrap();
        let now = Utc::now();
        let armed = PublishState::draft()
            .schedule(now - ChronoDuration::seconds(1), now - ChronoDuration::minutes(1))
            .unwrap();
        store.save_publish_state(page.id, &armed).await.unwrap();
        page.id
    }

    #[tokio::test]
    async fn sweep_publishes_overdue_page() {
        let store = MemoryStore::new();
        let id = scheduled_page(&store, "overdue").await;
        let publisher = ScheduledPublisher::new(Arc::new(store.clone()), SchedulerConfig::default());

        let report = publisher.sweep().await.unwrap();
        assert_eq!(report.published, 1);

        let page = store.find_page(id).await.unwrap().unwrap();
        assert_eq!(page.status, PageStatus::Published);
        assert!(page.scheduled_at.is_none());
    }

    #[tokio::test]
    async fn run_sweeps_on_start_and_stops_on_cancel() {
        let store = MemoryStore::new();
        let id = scheduled_page(&store, "on-start").await;
        let publisher = ScheduledPublisher::new(Arc::new(store.clone()), SchedulerConfig::default());

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(publisher.run(cancel.clone()));

        // The first tick fires immediately; wait for it to land.
        let mut published = false;
        for _ in 0..50 {
            let page = store.find_page(id).await.unwrap().unwrap();
            if page.status == PageStatus::Published {
                published = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(published, "first sweep should publish the overdue page");

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("publisher should stop after cancel")
            .unwrap();
    }
}
