//! Enrichment orchestrator
//!
//! Fans detail fetches out over a bounded worker pool and merges each
//! summary record with its classified detail fields. Output order always
//! matches input order, whatever order the fetches complete in.

use crate::config::Config;
use crate::crawler::detail::classify_and_extract;
use crate::crawler::fetcher::PageFetcher;
use crate::record::{MergedRecord, SummaryRecord};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Detail enrichment with at most `concurrency` fetches in flight
#[derive(Debug, Clone)]
pub struct Enricher {
    fetcher: PageFetcher,
    concurrency: usize,
    min_delay_ms: u64,
    max_delay_ms: u64,
    detail_suffix: String,
    timeout: Duration,
}

impl Enricher {
    /// Creates an enricher from the configuration
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared page fetcher
    /// * `config` - Supplies the concurrency, delays, detail suffix and timeout
    pub fn new(fetcher: PageFetcher, config: &Config) -> Self {
        Self {
            fetcher,
            concurrency: config.enrichment.concurrency.max(1) as usize,
            min_delay_ms: config.enrichment.min_delay_ms,
            max_delay_ms: config.enrichment.max_delay_ms,
            detail_suffix: config.source.detail_suffix.clone(),
            timeout: Duration::from_secs(config.http.detail_timeout_secs),
        }
    }

    /// Enriches every record, preserving order
    ///
    /// Records without a detail link pass through unchanged, and so does
    /// every record whose fetch fails or whose extraction task panics.
    ///
    /// # Arguments
    ///
    /// * `records` - Summary records in listing order
    ///
    /// # Returns
    ///
    /// One merged record per input record, in input order
    pub async fn enrich(&self, records: Vec<SummaryRecord>) -> Vec<MergedRecord> {
        let total = records.len();
        tracing::info!(
            "Enriching {} records with up to {} concurrent fetches",
            total,
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut slots: Vec<Option<MergedRecord>> = (0..total).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        // Kept to fill slots whose task never reported back
        let originals = records.clone();

        for (index, record) in records.into_iter().enumerate() {
            let Some(link) = record.link.as_deref() else {
                slots[index] = Some(MergedRecord::from_summary(record));
                continue;
            };

            let url = format!("{}{}", link, self.detail_suffix);
            let worker = self.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, MergedRecord::from_summary(record));
                };
                tokio::time::sleep(worker.pre_fetch_delay()).await;
                (index, worker.enrich_one(record, &url).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, merged)) => slots[index] = Some(merged),
                Err(e) => tracing::warn!("Enrichment task failed: {}", e),
            }
        }

        let merged: Vec<MergedRecord> = slots
            .into_iter()
            .zip(originals)
            .map(|(slot, original)| slot.unwrap_or_else(|| MergedRecord::from_summary(original)))
            .collect();

        let enriched = merged.iter().filter(|r| r.enrichment.is_some()).count();
        tracing::info!("Enriched {}/{} records", enriched, total);
        merged
    }

    async fn enrich_one(&self, record: SummaryRecord, url: &str) -> MergedRecord {
        let html = match self.fetcher.fetch(url, self.timeout).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Detail fetch failed for {}: {}", record.id, e);
                return MergedRecord::from_summary(record);
            }
        };

        // Parsing is CPU-bound; keep it off the runtime's worker threads
        match tokio::task::spawn_blocking(move || classify_and_extract(&html)).await {
            Ok((classification, fields)) => {
                tracing::debug!("{} classified as {}", record.id, classification);
                MergedRecord::enriched(record, classification, fields)
            }
            Err(e) => {
                tracing::warn!("Detail extraction failed for {}: {}", record.id, e);
                MergedRecord::from_summary(record)
            }
        }
    }

    /// Randomized pause spreading out request bursts
    fn pre_fetch_delay(&self) -> Duration {
        if self.max_delay_ms <= self.min_delay_ms {
            return Duration::from_millis(self.min_delay_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::crawler::fetcher::{build_http_client, RetryPolicy};
    use crate::record::Classification;
    use std::sync::Mutex;
    use std::time::Instant;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const COMPLETED: &str = "<html><body><p>Протокол подведения итогов</p>\n<p>Имя подписавшего: Иванов И.И.</p>\n</body></html>";

    fn enricher(server_uri: &str, concurrency: u32) -> Enricher {
        let config = parse_config(&format!(
            r#"
[source]
listing-url-template = "{server_uri}/list?page={{page}}"
pages = [1]

[enrichment]
concurrency = {concurrency}
min-delay-ms = 0
max-delay-ms = 0

[storage]
database-path = "unused.db"
"#
        ))
        .unwrap();

        let client = build_http_client(&config.http, config.enrichment.concurrency as usize).unwrap();
        let retry = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(5),
            jitter_min_ms: 0,
            jitter_max_ms: 0,
        };
        Enricher::new(PageFetcher::new(client, retry), &config)
    }

    fn summary(id: &str, link: Option<String>) -> SummaryRecord {
        SummaryRecord {
            link,
            ..SummaryRecord::new(id)
        }
    }

    #[tokio::test]
    async fn test_order_preserved_under_reversed_completion() {
        let server = MockServer::start().await;
        for (name, delay_ms) in [("a", 300u64), ("b", 150), ("c", 0)] {
            Mock::given(method("GET"))
                .and(path(format!("/detail/{}", name)))
                .and(query_param("tab", "general"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(COMPLETED)
                        .set_delay(Duration::from_millis(delay_ms)),
                )
                .mount(&server)
                .await;
        }

        let records: Vec<SummaryRecord> = ["a", "b", "c"]
            .iter()
            .map(|name| summary(name, Some(format!("{}/detail/{}", server.uri(), name))))
            .collect();

        let merged = enricher(&server.uri(), 3).enrich(records).await;

        let ids: Vec<&str> = merged.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(merged
            .iter()
            .all(|r| r.classification() == Some(Classification::Completed)));
    }

    /// Records when each request arrives, then answers after a fixed delay
    struct ArrivalLog {
        arrivals: Arc<Mutex<Vec<Instant>>>,
        delay: Duration,
    }

    impl Respond for ArrivalLog {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            self.arrivals.lock().unwrap().push(Instant::now());
            ResponseTemplate::new(200)
                .set_body_string(COMPLETED)
                .set_delay(self.delay)
        }
    }

    #[tokio::test]
    async fn test_in_flight_fetches_never_exceed_concurrency() {
        let server = MockServer::start().await;
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        let delay = Duration::from_millis(250);
        Mock::given(method("GET"))
            .and(path_regex(r"^/detail/\d+$"))
            .respond_with(ArrivalLog {
                arrivals: Arc::clone(&arrivals),
                delay,
            })
            .expect(12)
            .mount(&server)
            .await;

        let records: Vec<SummaryRecord> = (0..12)
            .map(|n| summary(&n.to_string(), Some(format!("{}/detail/{}", server.uri(), n))))
            .collect();

        let merged = enricher(&server.uri(), 3).enrich(records).await;
        assert_eq!(merged.len(), 12);

        // A request is still in flight for `delay` after it arrives, so any
        // window shorter than `delay` must never hold more than 3 arrivals
        let arrivals = arrivals.lock().unwrap();
        let window = Duration::from_millis(150);
        let max_in_flight = arrivals
            .iter()
            .map(|start| {
                arrivals
                    .iter()
                    .filter(|other| **other >= *start && other.duration_since(*start) < window)
                    .count()
            })
            .max()
            .unwrap_or(0);
        assert!(max_in_flight <= 3, "{} fetches in flight", max_in_flight);
        assert!(max_in_flight >= 2, "fetches did not overlap");
    }

    #[tokio::test]
    async fn test_missing_link_passes_through() {
        let server = MockServer::start().await;
        let merged = enricher(&server.uri(), 2)
            .enrich(vec![summary("no-link", None)])
            .await;

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], MergedRecord::from_summary(summary("no-link", None)));
    }

    #[tokio::test]
    async fn test_failed_fetch_passes_through_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let record = summary("down", Some(format!("{}/detail/down", server.uri())));
        let merged = enricher(&server.uri(), 1).enrich(vec![record.clone()]).await;

        assert_eq!(merged, vec![MergedRecord::from_summary(record)]);
    }

    #[tokio::test]
    async fn test_unknown_page_is_enriched_without_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Новости</body></html>"))
            .mount(&server)
            .await;

        let record = summary("plain", Some(format!("{}/detail/plain", server.uri())));
        let merged = enricher(&server.uri(), 1).enrich(vec![record]).await;

        assert_eq!(merged[0].classification(), Some(Classification::Unknown));
        assert!(merged[0].enrichment.as_ref().unwrap().fields.is_empty());
    }
}
