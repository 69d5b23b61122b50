//! Console and request-journal routing, captured through in-memory writers.

use std::io;
use std::sync::{Arc, Mutex};

use openprovider_registrar::api::ApiClient;
use openprovider_registrar::config::RegistrarConfig;
use openprovider_registrar::logging;
use serde_json::json;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Same layering as the CLI, at log level `info`.
fn capture_logs(debug: bool) -> (Capture, Capture, DefaultGuard) {
    let console = Capture::default();
    let journal = Capture::default();

    let filter = logging::console_filter(EnvFilter::new("info"), debug).unwrap();
    let subscriber = tracing_subscriber::registry()
        .with(logging::console_layer(filter, console.clone()))
        .with(logging::journal_layer(journal.clone()));

    let guard = tracing::subscriber::set_default(subscriber);
    (console, journal, guard)
}

async fn mock_api(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/v1beta/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "token": token }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1beta/domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "results": [ { "id": 4242 } ] }
        })))
        .mount(server)
        .await;
}

fn create_client(base_url: &str, debug: bool) -> ApiClient {
    let config = RegistrarConfig::new("reseller", "secret", base_url)
        .unwrap()
        .with_debug(debug);
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_debug_mode_dumps_bodies_at_info_level() {
    let mock_server = MockServer::start().await;
    mock_api(&mock_server, "t").await;
    let (console, _journal, _guard) = capture_logs(true);

    let client = create_client(&mock_server.uri(), true);
    client
        .get("/domains", &[("full_name", "example.com")])
        .await
        .unwrap();

    let output = console.contents();
    assert!(output.contains("OpenProvider request body"), "{output}");
    assert!(output.contains(r#"{"full_name":"example.com"}"#), "{output}");
    assert!(output.contains("OpenProvider response body"), "{output}");
    assert!(output.contains("4242"), "{output}");
}

#[tokio::test]
async fn test_bodies_stay_hidden_without_debug() {
    let mock_server = MockServer::start().await;
    mock_api(&mock_server, "t").await;
    let (console, _journal, _guard) = capture_logs(false);

    let client = create_client(&mock_server.uri(), false);
    client
        .get("/domains", &[("full_name", "example.com")])
        .await
        .unwrap();

    assert!(!console.contents().contains("OpenProvider request body"));
}

#[tokio::test]
async fn test_journal_goes_to_request_log_only() {
    let mock_server = MockServer::start().await;
    mock_api(&mock_server, "t").await;
    let (console, journal, _guard) = capture_logs(true);

    let client = create_client(&mock_server.uri(), true);
    client
        .get("/domains", &[("full_name", "example.com")])
        .await
        .unwrap();

    let records = journal.contents();
    assert_eq!(records.lines().count(), 1, "{records}");
    assert!(records.contains(r#""url":"/domains""#), "{records}");
    assert!(records.contains(r#""method":"GET""#), "{records}");
    assert!(!records.contains("OpenProvider request body"), "{records}");

    assert!(!console.contents().contains(r#""url":"#));
}

#[tokio::test]
async fn test_request_failed_is_journaled() {
    let mock_server = MockServer::start().await;
    mock_api(&mock_server, "").await;
    let (_console, journal, _guard) = capture_logs(false);

    let client = create_client(&mock_server.uri(), false);
    let response = client
        .post("/domains/check", &json!({ "domains": [] }))
        .await
        .unwrap();
    assert!(!response.is_success());

    let records = journal.contents();
    assert!(records.contains(r#""url":"/domains/check""#), "{records}");
    assert!(records.contains("Request failed"), "{records}");
}
