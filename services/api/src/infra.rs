use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use opsboard::comments::CommentStore;
use opsboard::config::{AppConfig, DataSource};
use opsboard::dashboard::cache::DatasetCache;
use opsboard::dashboard::dataset::{fetch_remote, Dataset, DatasetError};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared session context: the configured dataset source behind an explicit
/// TTL cache, plus the comment store side-channel.
pub(crate) struct DashboardContext {
    source: DataSource,
    fetch_timeout: Duration,
    cache_ttl: Duration,
    cache: Mutex<Option<DatasetCache>>,
    pub(crate) comments: CommentStore,
}

impl DashboardContext {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        Self {
            source: config.data_source.source.clone(),
            fetch_timeout: config.data_source.fetch_timeout,
            cache_ttl: config.data_source.cache_ttl,
            cache: Mutex::new(None),
            comments: CommentStore::new(config.comment_file.clone()),
        }
    }

    /// Context with a dataset already in memory; used by tests. The cache
    /// never expires, so the placeholder source is never consulted.
    #[cfg(test)]
    pub(crate) fn preloaded(dataset: Dataset, comments: CommentStore) -> Self {
        Self {
            source: DataSource::LocalFile("preloaded".into()),
            fetch_timeout: Duration::from_secs(1),
            cache_ttl: Duration::MAX,
            cache: Mutex::new(Some(DatasetCache::new(dataset, Duration::MAX))),
            comments,
        }
    }

    /// The current dataset, served from cache while fresh and reloaded from
    /// the configured source once stale. A failed reload surfaces as a
    /// `DatasetError`; the previous cache entry is kept so the next request
    /// can retry.
    pub(crate) async fn dataset(&self) -> Result<Dataset, DatasetError> {
        let mut guard = self.cache.lock().await;

        if let Some(cache) = guard.as_ref() {
            if !cache.is_stale() {
                return Ok(cache.data().clone());
            }
        }

        let dataset = self.load().await?;
        info!(records = dataset.len(), "dataset (re)loaded");

        match guard.as_mut() {
            Some(cache) => cache.replace(dataset.clone()),
            None => *guard = Some(DatasetCache::new(dataset.clone(), self.cache_ttl)),
        }

        Ok(dataset)
    }

    async fn load(&self) -> Result<Dataset, DatasetError> {
        match &self.source {
            DataSource::LocalFile(path) => Dataset::from_path(path),
            DataSource::RemoteCsv(url) => fetch_remote(url, self.fetch_timeout).await,
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
