//! Rate source trait and implementations.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tcurrency_common::CurrencyCode;
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};
use crate::table::{parse_rate_payload, RateTable};

/// Default public endpoint; the base code is appended as the last path segment.
pub const DEFAULT_RATE_ENDPOINT: &str = "https://api.exchangerate-api.com/v4/latest";

/// Trait for remote rate table sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch the full rate table anchored at `base`.
    async fn fetch_table(&self, base: &CurrencyCode) -> FxResult<RateTable>;
}

/// Rate source backed by `GET {endpoint}/{base}`.
///
/// Holds one long-lived client so repeated refreshes reuse connections.
pub struct HttpRateSource {
    client: Client,
    endpoint: String,
}

impl HttpRateSource {
    /// Create a source for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FxError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// URL queried for `base`.
    pub fn url_for(&self, base: &CurrencyCode) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), base)
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_table(&self, base: &CurrencyCode) -> FxResult<RateTable> {
        let url = self.url_for(base);
        debug!(url = %url, "Requesting rate table");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Rate request failed");
            FxError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Rate source returned error status");
            return Err(FxError::Network(format!("{} returned {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FxError::Network(format!("failed reading body: {}", e)))?;

        parse_rate_payload(&body, base)
    }
}

/// Rate source that reads a saved payload from disk.
///
/// The file holds the same JSON document the HTTP source returns. The requested
/// base is only used when the document omits its own.
pub struct FileRateSource {
    path: PathBuf,
}

impl FileRateSource {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RateSource for FileRateSource {
    fn name(&self) -> &str {
        "FILE"
    }

    async fn fetch_table(&self, base: &CurrencyCode) -> FxResult<RateTable> {
        let body = tokio::fs::read(&self.path).await.map_err(|e| {
            FxError::Network(format!("failed reading {}: {}", self.path.display(), e))
        })?;

        parse_rate_payload(&body, base)
    }
}

/// Mock rate source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    tables: dashmap::DashMap<CurrencyCode, RateTable>,
    failing: std::sync::atomic::AtomicBool,
    calls: std::sync::atomic::AtomicUsize,
    delay: Option<Duration>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// Create a new mock source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            failing: std::sync::atomic::AtomicBool::new(false),
            calls: std::sync::atomic::AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Delay every fetch by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the table served for its base.
    pub fn set_table(&self, table: RateTable) {
        self.tables.insert(table.base.clone(), table);
    }

    /// Make every subsequent fetch fail with a network error.
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of fetches attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_table(&self, base: &CurrencyCode) -> FxResult<RateTable> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(FxError::Network(format!("{} is offline", self.name)));
        }

        self.tables
            .get(base)
            .map(|t| {
                let mut table = t.clone();
                table.fetched_at = tcurrency_common::now();
                table
            })
            .ok_or_else(|| FxError::InvalidResponse(format!("no rates for {}", base)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_mock_source() {
        let source = MockRateSource::new("test");
        source.set_table(RateTable::from_pairs(CurrencyCode::usd(), [("EUR", 0.9)]));

        let table = source.fetch_table(&CurrencyCode::usd()).await.unwrap();
        assert_eq!(table.rate(&CurrencyCode::eur()), 0.9);
        assert_eq!(source.calls(), 1);

        let missing = source.fetch_table(&CurrencyCode::jpy()).await;
        assert!(matches!(missing, Err(FxError::InvalidResponse(_))));

        source.set_failing(true);
        let offline = source.fetch_table(&CurrencyCode::usd()).await;
        assert!(matches!(offline, Err(FxError::Network(_))));
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_http_url_for() {
        let source =
            HttpRateSource::new("https://rates.example.com/v4/latest/", Duration::from_secs(5))
                .unwrap();

        assert_eq!(
            source.url_for(&CurrencyCode::twd()),
            "https://rates.example.com/v4/latest/TWD"
        );
    }

    #[tokio::test]
    async fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"base":"EUR","date":"2024-05-01","rates":{{"USD":1.08}}}}"#).unwrap();

        let source = FileRateSource::new(file.path());
        let table = source.fetch_table(&CurrencyCode::usd()).await.unwrap();

        assert_eq!(table.base, CurrencyCode::eur());
        assert_eq!(table.rate(&CurrencyCode::usd()), 1.08);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileRateSource::new("/nonexistent/tcurrency/rates.json");
        let result = source.fetch_table(&CurrencyCode::usd()).await;

        assert!(matches!(result, Err(FxError::Network(_))));
    }
}
