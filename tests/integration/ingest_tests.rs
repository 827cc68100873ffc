//! Integration tests for the ingestion pipeline
//!
//! These tests use wiremock to serve listing and detail pages and run full
//! refreshes against a temporary SQLite database.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tender_sweep::config::{parse_config, Config};
use tender_sweep::crawler::{build_refresher, Coordinator, Refresher, Scheduler};
use tender_sweep::output::load_statistics;
use tender_sweep::record::Classification;
use tender_sweep::storage::{RunStatus, SqliteStore, TenderStore};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETED_DETAIL: &str = r#"<html><body>
<h3>Протокол подведения итогов</h3>
<p>1. Наименование заказчика: ГУ Отдел образования
2. Местонахождение заказчика: г. Алматы
</p>
<p>Имя подписавшего: Иванов И.И.</p>
</body></html>"#;

const PUBLISHED_DETAIL: &str = r#"<html><body>
<p>Дата и время вскрытия конвертов
09.02.2025 10:00:00</p>
<p>Адрес электронной почты
zakup@example.kz</p>
</body></html>"#;

/// Creates a test configuration pointing at the mock server
fn create_test_config(server_uri: &str, pages: &str, db_path: &str, max_retries: u32) -> Config {
    parse_config(&format!(
        r#"
[source]
listing-url-template = "{server_uri}/search?page={{page}}"
pages = {pages}

[retry]
max-retries = {max_retries}
base-delay-ms = 10
jitter-min-ms = 0
jitter-max-ms = 0

[enrichment]
concurrency = 4
min-delay-ms = 0
max-delay-ms = 0

[scheduler]
interval-secs = 60
dry-run = false

[storage]
database-path = "{db_path}"
"#
    ))
    .expect("test config is valid")
}

/// Renders a listing page whose rows link to `/tender/<id>`
fn listing_page(ids: &[&str]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr>
<td><strong>{id}</strong><small>Лотов: 1</small></td>
<td><a href="/tender/{id}">Закуп {id}</a><small>Организатор: ГУ Тест</small></td>
<td>Из одного источника</td>
<td>2025-02-01</td>
<td>2025-02-08</td>
<td><strong>100 000,00</strong></td>
<td>Опубликовано</td>
</tr>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><table id="search-result"><thead><tr><th>№</th></tr></thead><tbody>{rows}</tbody></table></body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: u32, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(ids)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/tender/{id}")))
        .respond_with(template)
        .mount(server)
        .await;
}

fn sqlite_refresher(config: Config, dir: &TempDir) -> Refresher<SqliteStore> {
    let store = SqliteStore::new(&dir.path().join("tenders.db")).expect("open store");
    build_refresher(config, Arc::new(Mutex::new(store)), "test-hash".to_string())
        .expect("build refresher")
}

#[tokio::test]
async fn test_full_refresh_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &["A1", "A2"]).await;
    mount_listing(&server, 2, &["A3"]).await;
    mount_detail(
        &server,
        "A1",
        ResponseTemplate::new(200).set_body_string(COMPLETED_DETAIL),
    )
    .await;
    mount_detail(&server, "A2", ResponseTemplate::new(404)).await;
    mount_detail(
        &server,
        "A3",
        ResponseTemplate::new(200).set_body_string(PUBLISHED_DETAIL),
    )
    .await;

    let config = create_test_config(&server.uri(), "[1, 2]", "unused.db", 3);
    let refresher = sqlite_refresher(config, &dir);

    let summary = refresher.refresh_once(false).await.unwrap();
    assert_eq!(summary.parsed_total, 3);
    assert_eq!(summary.inserted_new, 3);
    assert_eq!(summary.enriched, 2);

    {
        let store = refresher.store().lock().unwrap();
        assert_eq!(store.read_counter().unwrap(), 3);
        assert_eq!(store.count_entries().unwrap(), 3);

        let a1 = store.get_entry("A1").unwrap().unwrap();
        assert_eq!(a1.classification(), Some("completed"));
        assert_eq!(a1.document["customer_name"], "ГУ Отдел образования");
        assert_eq!(a1.document["signed_by"], "Иванов И.И.");
        assert_eq!(a1.document["title"], "Закуп A1");
        assert_eq!(a1.document["lots"], "1");
        assert_eq!(a1.document["organizer"], "ГУ Тест");
        assert_eq!(a1.document["amount"], "100 000,00");

        // Detail fetch failed: summary keys only
        let a2 = store.get_entry("A2").unwrap().unwrap();
        assert_eq!(a2.classification(), None);
        assert!(!a2.document.contains_key("customer_name"));
        assert!(a2.document["link"]
            .as_str()
            .unwrap()
            .ends_with("/tender/A2"));

        let a3 = store.get_entry("A3").unwrap().unwrap();
        assert_eq!(a3.classification(), Some("published"));
        assert_eq!(a3.document["opening_date"], "09.02.2025 10:00:00");
        assert_eq!(a3.document["contact_email"], "zakup@example.kz");
    }

    // Second run over the same listing adds nothing
    let summary = refresher.refresh_once(false).await.unwrap();
    assert_eq!(summary.parsed_total, 3);
    assert_eq!(summary.inserted_new, 0);

    let store = refresher.store().lock().unwrap();
    assert_eq!(store.read_counter().unwrap(), 3);

    let runs = store.recent_runs(5).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|run| run.status == RunStatus::Completed));
    assert_eq!(runs[0].inserted_new, Some(0));
    assert_eq!(runs[1].inserted_new, Some(3));

    let stats = load_statistics(&*store, 5).unwrap();
    assert_eq!(stats.drift, 0);
}

#[tokio::test]
async fn test_enrichment_preserves_listing_order() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &["A1", "A2", "A3"]).await;
    // Earlier records answer later
    for (id, delay_ms) in [("A1", 300), ("A2", 150), ("A3", 0)] {
        mount_detail(
            &server,
            id,
            ResponseTemplate::new(200)
                .set_body_string(PUBLISHED_DETAIL)
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .await;
    }

    let config = create_test_config(&server.uri(), "[1]", "unused.db", 1);
    let records = Coordinator::new(Arc::new(config))
        .unwrap()
        .run_pipeline()
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["A1", "A2", "A3"]);
    assert!(records
        .iter()
        .all(|r| r.classification() == Some(Classification::Published)));
}

#[tokio::test]
async fn test_detail_fetch_recovers_after_transient_errors() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &["A1"]).await;
    Mock::given(method("GET"))
        .and(path("/tender/A1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tender/A1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETED_DETAIL))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "[1]", "unused.db", 3);
    let records = Coordinator::new(Arc::new(config))
        .unwrap()
        .run_pipeline()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].classification(), Some(Classification::Completed));
}

#[tokio::test]
async fn test_exhausted_retries_keep_record_unchanged() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &["A1"]).await;
    Mock::given(method("GET"))
        .and(path("/tender/A1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "[1]", "unused.db", 3);
    let records = Coordinator::new(Arc::new(config))
        .unwrap()
        .run_pipeline()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].enrichment.is_none());
    assert_eq!(records[0].summary.title.as_deref(), Some("Закуп A1"));
}

#[tokio::test]
async fn test_dry_run_leaves_store_untouched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &["A1", "A2"]).await;
    mount_detail(
        &server,
        "A1",
        ResponseTemplate::new(200).set_body_string(COMPLETED_DETAIL),
    )
    .await;
    mount_detail(
        &server,
        "A2",
        ResponseTemplate::new(200).set_body_string(PUBLISHED_DETAIL),
    )
    .await;

    let config = create_test_config(&server.uri(), "[1]", "unused.db", 1);
    let refresher = sqlite_refresher(config, &dir);

    let summary = refresher.refresh_once(true).await.unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.parsed_total, 2);
    assert_eq!(summary.inserted_new, 2);

    let store = refresher.store().lock().unwrap();
    assert_eq!(store.count_entries().unwrap(), 0);
    assert_eq!(store.read_counter().unwrap(), 0);
    assert!(store.recent_runs(5).unwrap().is_empty());
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &["A1"]).await;
    mount_detail(&server, "A1", ResponseTemplate::new(404)).await;

    let config = create_test_config(&server.uri(), "[1]", "unused.db", 1);
    let first = sqlite_refresher(config.clone(), &dir);
    assert_eq!(first.refresh_once(false).await.unwrap().inserted_new, 1);
    drop(first);

    let second = sqlite_refresher(config, &dir);
    assert_eq!(second.refresh_once(false).await.unwrap().inserted_new, 0);
    assert_eq!(second.store().lock().unwrap().read_counter().unwrap(), 1);
}

#[tokio::test]
async fn test_scheduler_tick_survives_unreachable_listing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "[1, 2]", "unused.db", 1);
    let scheduler_config = config.scheduler.clone();
    let scheduler = Scheduler::new(sqlite_refresher(config, &dir), &scheduler_config);

    assert!(scheduler.tick().await.is_none());
    assert!(scheduler.tick().await.is_none());

    let store = scheduler.refresher().store().lock().unwrap();
    let runs = store.recent_runs(5).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|run| run.status == RunStatus::Failed));
    assert_eq!(store.count_entries().unwrap(), 0);
}
