//! Integration tests for the census
//!
//! These tests use wiremock to serve directory listings over real HTTP and
//! run the full fetch -> parse -> aggregate -> persist cycle end-to-end.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use volume_census::config::Config;
use volume_census::crawler::{run_census, Coordinator, Shutdown};
use volume_census::metadata::{extract_work_items, load_volumes};
use volume_census::output::{count_groups, export_csv, load_snapshot, JsonPersister};
use volume_census::WorkItem;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, results_path: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.base_url = base_url.to_string();
    config.crawler.max_workers = 4;
    config.crawler.retry_backoff_ms = 5;
    config.crawler.request_delay_ms = 0;
    config.output.results_path = results_path.display().to_string();
    config
}

/// Renders an autoindex-style listing with a parent-directory row first
fn listing_page(rows: &[(&str, &str, &str)]) -> String {
    let mut html = String::from(
        "<html><head><title>Index</title></head><body><table>\n\
         <tr><th>Name</th><th>Size</th><th>Last Modified</th></tr>\n\
         <tr><td><a href=\"../\">Parent Directory</a></td><td>-</td><td></td></tr>\n",
    );
    for (name, size, modified) in rows {
        html.push_str(&format!(
            "<tr><td><a href=\"{0}\">{0}</a></td><td>{1}</td><td>{2}</td></tr>\n",
            name, size, modified
        ));
    }
    html.push_str("</table></body></html>");
    html
}

/// Mounts the three-listing scenario: one listing, one missing, one flaky
async fn mount_scenario(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/us/1/cases/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[
            ("0001-01.json", "10 B", "2024-03-01 12:00"),
            ("0002-01.json", "1.00 KB", "2024-03-01 12:01"),
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/us/2/cases/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    // Two server errors first; once exhausted the next mock answers
    Mock::given(method("GET"))
        .and(path("/cal/3/cases/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cal/3/cases/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[(
            "0003-01.json",
            "2.00 MB",
            "2024-03-02 08:30",
        )])))
        .mount(server)
        .await;
}

fn scenario_items() -> Vec<WorkItem> {
    vec![
        WorkItem::new("us", "1"),
        WorkItem::new("us", "2"),
        WorkItem::new("cal", "3"),
    ]
}

#[tokio::test]
async fn test_full_census_over_http() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");
    let config = create_test_config(&server.uri(), &results_path);

    let outcome = run_census(config, scenario_items()).await.unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.report.total_files, 3);
    assert_eq!(outcome.report.total_bytes, 10 + 1024 + 2_097_152);
    assert_eq!(outcome.report.successful_directories, 2);
    assert_eq!(outcome.stats.processed, 3);
    assert_eq!(outcome.stats.absent, 1);
    assert!(outcome.stats.failed.is_empty());

    let us_1 = outcome.snapshot.get("us", "1").unwrap();
    assert_eq!(us_1.details.len(), 2);
    assert_eq!(us_1.details[1].size_display, "1.00 KB");
    assert!(outcome.snapshot.get("us", "2").is_none());
    assert_eq!(outcome.snapshot.get("cal", "3").unwrap().total_size_bytes, 2_097_152);

    let persisted = load_snapshot(&results_path).unwrap();
    assert_eq!(persisted, outcome.snapshot);
}

#[tokio::test]
async fn test_persisted_document_shape() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");
    let config = create_test_config(&server.uri(), &results_path);

    run_census(config, scenario_items()).await.unwrap();

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&results_path).unwrap()).unwrap();
    assert_eq!(document["us"]["1"]["files"], 2);
    assert_eq!(document["us"]["1"]["size"], 1034);
    assert_eq!(document["us"]["1"]["details"][0]["filename"], "0001-01.json");
    assert_eq!(document["us"]["1"]["details"][0]["size_str"], "10 B");
    assert_eq!(document["cal"]["3"]["details"][0]["last_modified"], "2024-03-02 08:30");
    assert!(document["us"].get("2").is_none());
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/us/1/cases/"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[(
            "0001-01.json",
            "1 KB",
            "2024-03-01",
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("results.json"));
    let persister = JsonPersister::new(dir.path().join("results.json"));

    let coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator
        .run(vec![WorkItem::new("us", "1")], &Shutdown::new(), &persister)
        .await
        .unwrap();

    assert_eq!(outcome.report.total_files, 1);
    server.verify().await;
}

#[tokio::test]
async fn test_exhausted_retries_mark_item_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bad/1/cases/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/good/1/cases/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[(
            "a.json",
            "2 KB",
            "2024-03-01",
        )])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("results.json"));

    let outcome = run_census(
        config,
        vec![WorkItem::new("bad", "1"), WorkItem::new("good", "1")],
    )
    .await
    .unwrap();

    assert_eq!(outcome.stats.processed, 2);
    assert_eq!(outcome.stats.failed.len(), 1);
    assert_eq!(outcome.stats.failed[0].item, WorkItem::new("bad", "1"));
    assert_eq!(outcome.stats.failed[0].reason, "HTTP 503");
    assert_eq!(outcome.report.total_bytes, 2048);
    server.verify().await;
}

#[tokio::test]
async fn test_metadata_to_csv_pipeline() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    let dir = TempDir::new().unwrap();
    let volumes_path = dir.path().join("VolumesMetadata.json");
    fs::write(
        &volumes_path,
        r#"[
            {"reporter_slug": "us", "volume_number": "1"},
            {"reporter_slug": "us", "volume_number": 1},
            {"reporter_slug": "us", "volume_number": "2"},
            {"reporter_slug": "cal", "volume_number": 3},
            {"reporter_slug": "", "volume_number": "9"},
            {"volume_number": "4"}
        ]"#,
    )
    .unwrap();

    let items = extract_work_items(&load_volumes(&volumes_path).unwrap());
    assert_eq!(items, scenario_items());

    let results_path = dir.path().join("results.json");
    let config = create_test_config(&server.uri(), &results_path);
    run_census(config, items).await.unwrap();

    let summary_path = dir.path().join("summary.csv");
    let detailed_path = dir.path().join("detailed.csv");
    let counts = export_csv(
        &load_snapshot(&results_path).unwrap(),
        &summary_path,
        &detailed_path,
    )
    .unwrap();

    assert_eq!(counts.summary_rows, 2);
    assert_eq!(counts.detail_rows, 3);
    assert_eq!(counts.total_bytes, 2_098_186);
    assert_eq!(count_groups(&summary_path).unwrap(), 2);

    let detailed = fs::read_to_string(&detailed_path).unwrap();
    assert!(detailed.contains("us,1,0002-01.json,1024,1.00 KB,2024-03-01 12:01"));
}
