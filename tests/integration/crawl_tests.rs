//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the film site and drive the real
//! controller and reqwest circuits end-to-end over direct connections.

use reelmine::config::{
    Config, DatasetFormat, NetworkConfig, OutputConfig, RetryConfig, TargetConfig,
};
use reelmine::crawler::crawl;
use reelmine::record::{MovieRecord, FIELD_NAMES};
use reelmine::storage::{CsvStorage, RunStatus, SqliteStorage, Storage};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BAN_PAGE: &str = r#"<html><head><title>Ой!</title></head><body>
<form action="/checkcaptcha"><img src="/captchaimg"><input name="rep"></form>
</body></html>"#;

/// Creates a test configuration against the mock server
fn create_test_config(
    server: &MockServer,
    dir: &TempDir,
    ids: &[&str],
    format: DatasetFormat,
) -> Config {
    let ids_path = dir.path().join("ids.txt");
    std::fs::write(&ids_path, ids.join("\n")).expect("Failed to write id list");

    let dataset_name = match format {
        DatasetFormat::Csv => "kinopoisk.csv",
        DatasetFormat::Sqlite => "kinopoisk.sqlite",
    };

    Config {
        target: TargetConfig {
            url_template: format!("{}/film/{{}}/", server.uri()),
            ids_path: ids_path.to_string_lossy().into_owned(),
        },
        network: NetworkConfig {
            proxy: None,
            request_timeout_ms: 500, // Short so delayed responses time out
            ..NetworkConfig::default()
        },
        retry: RetryConfig::default(),
        output: OutputConfig {
            dataset_path: dir.path().join(dataset_name).to_string_lossy().into_owned(),
            format,
        },
    }
}

fn film_page(title: &str, year: &str) -> String {
    format!(
        r#"<html><head><meta itemprop="duration" content="PT100M"></head><body>
        <h1 class="moviename-big">{}</h1>
        <table class="info">
            <tr><td class="type">год</td><td><div><a>{}</a></div></td></tr>
            <tr><td class="type">жанр</td><td><span><a>драма</a>, <a>криминал</a></span></td></tr>
        </table>
        <span class="rating_ball">8.500</span>
        </body></html>"#,
        title, year
    )
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.into())
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_film(server: &MockServer, id: &str, title: &str, year: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/film/{}/", id)))
        .respond_with(html(film_page(title, year)))
        .mount(server)
        .await;
}

fn load_csv(config: &Config) -> Vec<MovieRecord> {
    CsvStorage::new(Path::new(&config.output.dataset_path))
        .expect("Failed to open dataset")
        .load_records()
        .expect("Failed to load dataset")
}

fn titled(id: &str, title: &str) -> MovieRecord {
    let mut record = MovieRecord::new(id);
    record.title_ru = Some(title.to_string());
    record
}

#[tokio::test]
async fn test_full_crawl_to_csv() {
    let mock_server = MockServer::start().await;
    mount_film(&mock_server, "326", "Побег из Шоушенка", "1994").await;
    mount_film(&mock_server, "435", "Зеленая миля", "1999").await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server, &dir, &["326", "435"], DatasetFormat::Csv);

    let stats = crawl(config.clone(), "test-hash")
        .await
        .expect("Crawl failed");

    assert_eq!(stats.persisted, 2);
    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.circuits_acquired, 1);
    assert_eq!(stats.rotations, 0);

    let content = std::fs::read_to_string(&config.output.dataset_path).expect("No dataset");
    let header_line = content.lines().next().expect("Empty dataset");
    assert_eq!(header_line, FIELD_NAMES.join(","));

    let rows = load_csv(&config);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "326");
    assert_eq!(rows[0].title_ru.as_deref(), Some("Побег из Шоушенка"));
    assert_eq!(rows[0].year.as_deref(), Some("1994"));
    assert_eq!(rows[0].genre.as_deref(), Some("драма, криминал"));
    assert_eq!(rows[0].duration.as_deref(), Some("PT100M"));
    assert_eq!(rows[0].kinopoisk_score.as_deref(), Some("8.500"));
    assert_eq!(rows[0].title_orig, None);
    assert_eq!(rows[1].id, "435");
}

#[tokio::test]
async fn test_timeout_and_ban_rotate_then_succeed() {
    let mock_server = MockServer::start().await;

    // Mocks match in registration order: first a hang, then a block page
    Mock::given(method("GET"))
        .and(path("/film/326/"))
        .respond_with(html(film_page("Побег", "1994")).set_delay(Duration::from_secs(3)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/film/326/"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string(BAN_PAGE)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    mount_film(&mock_server, "326", "Побег из Шоушенка", "1994").await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server, &dir, &["326"], DatasetFormat::Csv);

    let stats = crawl(config.clone(), "test-hash")
        .await
        .expect("Crawl failed");

    assert_eq!(stats.attempts, 3);
    assert_eq!(stats.transient_failures, 1);
    assert_eq!(stats.soft_bans, 1);
    assert_eq!(stats.rotations, 2);
    assert_eq!(stats.circuits_acquired, 3);
    assert_eq!(stats.persisted, 1);

    let requests = mock_server
        .received_requests()
        .await
        .expect("Request recording disabled");
    assert_eq!(requests.len(), 3);

    let rows = load_csv(&config);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title_ru.as_deref(), Some("Побег из Шоушенка"));
}

#[tokio::test]
async fn test_resume_skips_persisted_films() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/film/1/"))
        .respond_with(html(film_page("Один", "2001")))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/film/2/"))
        .respond_with(html(film_page("Два", "2002")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/film/3/"))
        .respond_with(html(film_page("Три", "2003")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server, &dir, &["1", "2", "3"], DatasetFormat::Csv);

    // A previous run saved film 1 and left an untitled row for film 2
    {
        let mut storage = CsvStorage::new(Path::new(&config.output.dataset_path))
            .expect("Failed to create dataset");
        storage.append_record(&titled("1", "Один")).unwrap();
        storage.append_record(&MovieRecord::new("2")).unwrap();
    }

    let stats = crawl(config.clone(), "test-hash")
        .await
        .expect("Crawl failed");
    assert_eq!(stats.persisted, 2);

    let ids: Vec<String> = load_csv(&config).into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    // Nothing left: a second run makes no requests
    let stats = crawl(config.clone(), "test-hash")
        .await
        .expect("Crawl failed");
    assert_eq!(stats.attempts, 0);
    assert_eq!(stats.circuits_acquired, 0);
}

#[tokio::test]
async fn test_sqlite_dataset_records_run() {
    let mock_server = MockServer::start().await;
    mount_film(&mock_server, "10", "Десять", "2010").await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server, &dir, &["10"], DatasetFormat::Sqlite);

    let stats = crawl(config.clone(), "test-hash")
        .await
        .expect("Crawl failed");
    assert_eq!(stats.persisted, 1);

    let storage =
        SqliteStorage::new(Path::new(&config.output.dataset_path)).expect("Failed to open db");
    let rows = storage.load_records().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title_ru.as_deref(), Some("Десять"));
    assert_eq!(rows[0].slogan, None);

    let run = storage.latest_run().unwrap().expect("No run recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_browser_headers_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/film/7/"))
        .and(header("cache-control", "max-age=0"))
        .and(header("upgrade-insecure-requests", "1"))
        .respond_with(html(film_page("Семь", "1995")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server, &dir, &["7"], DatasetFormat::Csv);

    let stats = crawl(config, "test-hash").await.expect("Crawl failed");
    assert_eq!(stats.persisted, 1);
    assert_eq!(stats.soft_bans, 0);
}

#[tokio::test]
async fn test_attempt_cap_leaves_film_for_next_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/film/1/"))
        .respond_with(html(BAN_PAGE))
        .mount(&mock_server)
        .await;
    mount_film(&mock_server, "2", "Два", "2002").await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&mock_server, &dir, &["1", "2"], DatasetFormat::Csv);
    config.retry = RetryConfig {
        max_attempts_per_target: 3,
        rotation_delay_ms: 10,
    };

    let stats = crawl(config.clone(), "test-hash")
        .await
        .expect("Crawl failed");
    assert_eq!(stats.soft_bans, 3);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.persisted, 1);

    let ids: Vec<String> = load_csv(&config).into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["2"]);
}
