//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small paginated catalog and run the
//! full crawl cycle end-to-end against a temporary output directory.

use resolution_harvest::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use resolution_harvest::{Coordinator, CrawlState, JsonStateStore, StateStore, StopReason};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PDF_ONE: &[u8] = b"%PDF-1.4\nfirst resolution\n%%EOF\n";
const PDF_TWO: &[u8] = b"%PDF-1.4\nsecond resolution, a little longer\n%%EOF\n";

/// Creates a test configuration pointing at the mock catalog
fn create_test_config(base_url: &str, out_dir: &Path, resume: bool) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url: format!("{}/listado/1", base_url),
            delay: 0.0, // No pacing in tests
            max_pages: 0,
            timeout: 5.0,
            max_attempts: 2,
            backoff_base: 0.01,
            backoff_max: 0.02,
            resume,
            respect_robots: true,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        output: OutputConfig {
            directory: out_dir.to_path_buf(),
            state_file: "_state.json".to_string(),
        },
        ..Config::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn pdf(body: &'static [u8]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(body)
        .insert_header("content-type", "application/pdf")
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

/// Two listing pages:
/// - page 1: a direct PDF link and a detail page leading to a PDF
/// - page 2: a detail page without any PDF, and no next link
async fn mount_catalog(server: &MockServer) {
    mount_robots(server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/listado/1"))
        .respond_with(html(
            r#"<ul>
                <li><a href="/files/PS-00001-2024.pdf">Resolución PS-00001-2024</a></li>
                <li>Archivo de actuaciones <a href="/ficha/2">Ver documento</a></li>
            </ul>
            <a href="/listado/2">Siguiente ›</a>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/listado/2"))
        .respond_with(html(
            r#"<ul><li><a href="/ficha/3">Ver documento</a></li></ul>
            <a href="/listado/1">Anterior</a>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ficha/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Resolución PS-00002-2024</title></head>
            <body><h1>Resolución PS-00002-2024</h1>
            <a href="/files/res2.pdf">Descargar PDF</a></body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ficha/3"))
        .respond_with(html("<h1>Resolución sin documento</h1><p>Pendiente</p>"))
        .mount(server)
        .await;

    for file in ["/files/PS-00001-2024.pdf", "/files/res2.pdf"] {
        Mock::given(method("HEAD"))
            .and(path(file))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
            .mount(server)
            .await;
    }

    // Each PDF body is fetched exactly once, whatever the number of runs
    Mock::given(method("GET"))
        .and(path("/files/PS-00001-2024.pdf"))
        .respond_with(pdf(PDF_ONE))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/res2.pdf"))
        .respond_with(pdf(PDF_TWO))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let out = TempDir::new().unwrap();

    let config = create_test_config(&server.uri(), out.path(), false);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.pages, 2);
    assert_eq!(report.stats.attempted, 3);
    assert_eq!(report.stats.downloaded, 2);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.unresolved, 1);
    assert_eq!(report.stats.failed, 0);

    assert_eq!(std::fs::read(out.path().join("PS-00001-2024.pdf")).unwrap(), PDF_ONE);
    assert_eq!(std::fs::read(out.path().join("PS-00002-2024.pdf")).unwrap(), PDF_TWO);

    // No temporary files are left behind
    let leftovers: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".part") || name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);

    let state = JsonStateStore::new(out.path().join("_state.json")).load().unwrap();
    assert_eq!(state.pages_visited, 2);
    assert!(state.exhausted);
    assert!(state.next_page_url.ends_with("/listado/2"));
    assert!(state.is_completed("PS-00001-2024"));
    assert!(state.is_completed("PS-00002-2024"));
    assert_eq!(state.completed_ids.len(), 2);
}

#[tokio::test]
async fn test_resume_is_idempotent() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let out = TempDir::new().unwrap();

    let first = Coordinator::new(create_test_config(&server.uri(), out.path(), true))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.stats.downloaded, 2);

    // The finished pass restarts from page 1; nothing is downloaded again
    let second = Coordinator::new(create_test_config(&server.uri(), out.path(), true))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(second.stop_reason, StopReason::Exhausted);
    assert_eq!(second.stats.downloaded, 0);
    assert_eq!(second.stats.failed, 0);
    assert_eq!(second.stats.skipped, 3);
    assert_eq!(second.state.completed_ids, first.state.completed_ids);
    assert_eq!(std::fs::read(out.path().join("PS-00001-2024.pdf")).unwrap(), PDF_ONE);
}

#[tokio::test]
async fn test_stray_part_file_replaced() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let out = TempDir::new().unwrap();

    let part = out.path().join("PS-00001-2024.pdf.part");
    std::fs::write(&part, vec![b'#'; 10_000]).unwrap();

    let config = create_test_config(&server.uri(), out.path(), true);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stats.downloaded, 2);
    assert!(!part.exists());
    assert_eq!(std::fs::read(out.path().join("PS-00001-2024.pdf")).unwrap(), PDF_ONE);
}

#[tokio::test]
async fn test_page_limit_then_resume() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let out = TempDir::new().unwrap();

    let mut config = create_test_config(&server.uri(), out.path(), true);
    config.crawler.max_pages = 1;
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::PageLimit);
    assert_eq!(report.pages, 1);
    assert!(!report.state.exhausted);
    assert!(report.state.next_page_url.ends_with("/listado/2"));

    // The next run picks up at page 2
    let report = Coordinator::new(create_test_config(&server.uri(), out.path(), true))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.pages, 1);
    assert_eq!(report.state.pages_visited, 2);
    assert_eq!(report.stats.unresolved, 1);
    assert_eq!(report.state.completed_ids.len(), 2);
}

#[tokio::test]
async fn test_listing_failure_stops_cleanly() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/listado/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), out.path(), false);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::ListingUnavailable);
    assert_eq!(report.pages, 0);
    assert!(report.state.next_page_url.ends_with("/listado/1"));
}

#[tokio::test]
async fn test_corrupt_state_starts_fresh() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let out = TempDir::new().unwrap();
    std::fs::write(out.path().join("_state.json"), "{\"next_page_url\": 42").unwrap();

    let config = create_test_config(&server.uri(), out.path(), true);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.stats.downloaded, 2);

    let state = JsonStateStore::new(out.path().join("_state.json")).load().unwrap();
    assert_eq!(state.pages_visited, 2);
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /listado").await;

    Mock::given(method("GET"))
        .and(path("/listado/1"))
        .respond_with(html("<a href=\"/a.pdf\">A</a>"))
        .expect(0)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), out.path(), false);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::RobotsDenied);
    assert_eq!(report.pages, 0);

    // Ignoring robots.txt fetches the page
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /listado").await;
    Mock::given(method("GET"))
        .and(path("/listado/1"))
        .respond_with(html("<p>Sin resultados</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), out.path(), false);
    config.crawler.respect_robots = false;
    let report = Coordinator::new(config).unwrap().run().await.unwrap();
    assert_eq!(report.stop_reason, StopReason::Exhausted);
}

#[tokio::test]
async fn test_pagination_loop_detected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/listado/1"))
        .respond_with(html(r#"<a href="/listado/2">Siguiente</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/listado/2"))
        .respond_with(html(r#"<a href="/listado/1">Siguiente</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), out.path(), false);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::PaginationLoop);
    assert_eq!(report.pages, 2);
    assert!(report.state.exhausted);
}

#[tokio::test]
async fn test_download_failure_is_counted() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;

    Mock::given(method("GET"))
        .and(path("/listado/1"))
        .respond_with(html(r#"<a href="/files/PS-00009-2024.pdf">PS-00009-2024</a>"#))
        .mount(&server)
        .await;

    // HEAD accepts the file, but every GET of it fails
    Mock::given(method("HEAD"))
        .and(path("/files/PS-00009-2024.pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/PS-00009-2024.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), out.path(), false);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.downloaded, 0);
    assert!(!report.state.is_completed("PS-00009-2024"));
    assert!(!out.path().join("PS-00009-2024.pdf").exists());
}

#[tokio::test]
async fn test_same_basename_files_kept_apart() {
    let server = MockServer::start().await;
    mount_robots(&server, "").await;

    Mock::given(method("GET"))
        .and(path("/listado/1"))
        .respond_with(html(
            r#"<a href="/2023/resolucion.pdf">Resolución 2023</a>
            <a href="/2024/resolucion.pdf">Resolución 2024</a>"#,
        ))
        .mount(&server)
        .await;

    for (file, body) in [("/2023/resolucion.pdf", PDF_ONE), ("/2024/resolucion.pdf", PDF_TWO)] {
        Mock::given(method("HEAD"))
            .and(path(file))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(file))
            .respond_with(pdf(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), out.path(), true);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stats.downloaded, 2);
    assert_eq!(report.stats.skipped, 0);
    assert_eq!(report.state.completed_ids.len(), 2);

    let mut contents: Vec<Vec<u8>> = std::fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "pdf"))
        .map(|p| std::fs::read(p).unwrap())
        .collect();
    contents.sort();
    assert_eq!(contents, vec![PDF_ONE.to_vec(), PDF_TWO.to_vec()]);
}

#[tokio::test]
async fn test_fresh_run_keeps_completed_ids() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let out = TempDir::new().unwrap();

    let store = JsonStateStore::new(out.path().join("_state.json"));
    let mut earlier = CrawlState::new(&url::Url::parse("https://elsewhere.example/x?page=9").unwrap());
    for n in 1..=5 {
        earlier.mark_completed(format!("EX-0000{}-2020", n));
    }
    store.save(&earlier).unwrap();

    let config = create_test_config(&server.uri(), out.path(), false);
    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.stats.downloaded, 2);

    let state = store.load().unwrap();
    assert_eq!(state.completed_ids.len(), 7);
    assert_eq!(state.pages_visited, 2);
    assert!(state.next_page_url.ends_with("/listado/2"));
    assert!(state.is_completed("EX-00001-2020"));
    assert!(state.is_completed("PS-00002-2024"));
}
