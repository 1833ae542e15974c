//! Integration tests for the crawl engine
//!
//! These tests use wiremock to serve the pages and a SQLite file as the
//! durable store, and drive the crawl one process lifetime at a time.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tidewalk::config::{parse_config, Config};
use tidewalk::crawler::{Host, StartOptions, StepOutcome};
use tidewalk::output::{load_last_report, CrawlStatus};
use tidewalk::storage::{PlanStore, SqliteStore, StateStore};
use tidewalk::TidewalkError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn item_page(title: &str, price: u32) -> String {
    format!(
        r#"<html><body>
            <main class="item">
                <h1 class="title">{}</h1>
                <span class="price">{}</span>
            </main>
        </body></html>"#,
        title, price
    )
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let content = format!(
        r#"
[crawl]
retry-limit = 2

[storage]
database-path = "{db}"

[extraction]
ready-selector = "main.item"
ready-timeout-ms = 1000
poll-interval-ms = 10

[[extraction.fields]]
name = "title"
selector = ".title"

[[extraction.fields]]
name = "price"
selector = ".price"

[user-agent]
crawler-name = "TestWalker"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[host]
base-url = "{base}/"
navigation-delay-ms = 0

[output]
results-path = "{results}"
"#,
        db = dir.join("state.db").display(),
        base = base_url,
        results = dir.join("out/results.json").display(),
    );
    parse_config(&content).expect("Failed to parse test config")
}

/// A host over a freshly opened store, as a new process would build it
fn open_host(config: &Config) -> Host {
    let store: Arc<dyn StateStore> = Arc::new(
        SqliteStore::open(Path::new(&config.storage.database_path)).expect("Failed to open store"),
    );
    Host::new(config.clone(), Some("test-hash".to_string()), store).expect("Failed to build host")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn read_results(config: &Config) -> serde_json::Value {
    let path = config.output.results_path.as_ref().expect("results path");
    let content = std::fs::read_to_string(path).expect("Failed to read results");
    serde_json::from_str(&content).expect("Results are not JSON")
}

#[tokio::test]
async fn test_full_crawl_with_failed_location() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    mount_page(&server, "/a.html", item_page("Alpha", 12)).await;
    mount_page(&server, "/b.html", item_page("Beta", 30)).await;

    // The missing page is requested once per attempt
    Mock::given(method("GET"))
        .and(path("/missing.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let host = open_host(&config);
    let accepted = host
        .start(["a.html", "missing.html", "b.html"], StartOptions::default())
        .await
        .unwrap();
    assert_eq!(accepted, 3);

    let outcome = host.drive(None).await.unwrap();
    let StepOutcome::Completed(summary) = outcome else {
        panic!("Expected completion, got {:?}", outcome);
    };
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    let results = read_results(&config);
    assert_eq!(results["status"], "completed");
    assert_eq!(results["failedLocations"], serde_json::json!(["missing.html"]));

    let records = results["results"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["location"], "a.html");
    assert_eq!(records[0]["itemNumber"], 1);
    assert_eq!(records[0]["fields"]["title"], "Alpha");
    assert_eq!(records[0]["fields"]["price"], 12);
    assert_eq!(records[1]["location"], "b.html");
    assert_eq!(records[1]["itemNumber"], 3);

    let cached = load_last_report(&host.cache()).await.unwrap().unwrap();
    assert_eq!(cached.plan_id, summary.plan_id);

    assert_eq!(host.run_lifetime().await.unwrap(), StepOutcome::NotCrawling);
}

#[tokio::test]
async fn test_each_lifetime_resumes_from_disk() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    mount_page(&server, "/a.html", item_page("Alpha", 1)).await;
    mount_page(&server, "/b.html", item_page("Beta", 2)).await;

    open_host(&config)
        .start(["a.html", "b.html"], StartOptions::default())
        .await
        .unwrap();

    let first = open_host(&config).run_lifetime().await.unwrap();
    assert_eq!(
        first,
        StepOutcome::Advanced {
            next: "b.html".to_string(),
            cursor: 1
        }
    );

    let store: Arc<dyn StateStore> = Arc::new(
        SqliteStore::open(Path::new(&config.storage.database_path)).unwrap(),
    );
    let plan = PlanStore::new(store).load().await.unwrap().unwrap();
    assert_eq!(plan.cursor, 1);
    assert_eq!(plan.results.len(), 1);
    assert_eq!(plan.config_hash.as_deref(), Some("test-hash"));

    let second = open_host(&config).run_lifetime().await.unwrap();
    assert!(matches!(second, StepOutcome::Completed(_)));

    let results = read_results(&config);
    assert_eq!(results["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_page_that_is_still_loading_is_polled() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/slow.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/slow.html", item_page("Slow", 5)).await;

    let host = open_host(&config);
    host.start(["slow.html"], StartOptions::default())
        .await
        .unwrap();

    let outcome = host.drive(None).await.unwrap();
    let StepOutcome::Completed(summary) = outcome else {
        panic!("Expected completion, got {:?}", outcome);
    };
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_no_matching_locations_starts_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let host = open_host(&config);
    let err = host
        .start(["", "  ", ""], StartOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TidewalkError::EmptyInput { submitted: 3 }));

    assert_eq!(host.run_lifetime().await.unwrap(), StepOutcome::NotCrawling);
    assert!(host.orchestrator().status().await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancelled_crawl_keeps_partial_results() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    mount_page(&server, "/a.html", item_page("Alpha", 1)).await;
    mount_page(&server, "/b.html", item_page("Beta", 2)).await;

    let host = open_host(&config);
    host.start(["a.html", "b.html"], StartOptions::default())
        .await
        .unwrap();
    host.drive(Some(1)).await.unwrap();

    assert!(open_host(&config).orchestrator().cancel().await.unwrap());

    let outcome = open_host(&config).drive(None).await.unwrap();
    let StepOutcome::Completed(summary) = outcome else {
        panic!("Expected completion, got {:?}", outcome);
    };
    assert_eq!(summary.status, CrawlStatus::Cancelled);

    let results = read_results(&config);
    assert_eq!(results["status"], "cancelled");
    assert_eq!(results["results"].as_array().unwrap().len(), 1);
}
