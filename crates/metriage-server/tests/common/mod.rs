#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use metriage_server::app;
use metriage_server::config::ServerConfig;
use metriage_server::state::AppState;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "metriage-test-boundary";

pub const SNAPSHOT: &str = r#"# HELP rox_sensor_version_info Sensor build information
rox_sensor_version_info{version="4.8.2"} 1
rox_sensor_events_dropped_total 3
rox_sensor_events_total 100
rox_sensor_pods 12
"#;

const DROPPED_RULE: &str = r#"
rule_type = "percentage"
display_name = "Dropped events"
description = "Share of sensor events dropped"
[percentage_config]
numerator = "rox_sensor_events_dropped_total"
denominator = "rox_sensor_events_total"
[thresholds]
low = 1
high = 5
[messages]
green = "{value:.1f}% dropped"
yellow = "{value:.1f}% dropped ({numerator} of {denominator})"
red = "{value:.1f}% dropped"
[remediation]
yellow = "Check sensor memory limits"
"#;

const PODS_RULE: &str = r#"
rule_type = "gauge_threshold"
metric_name = "rox_sensor_pods"
description = "Pods tracked by sensor"
[thresholds]
low = 1000
high = 5000
higher_is_worse = true
[messages]
green = "{value} pods"
yellow = "{value} pods"
red = "{value} pods"
"#;

pub struct TestContext {
    pub rules_dir: TempDir,
    pub app: axum::Router,
}

pub fn write_rules(dir: &TempDir) {
    std::fs::write(dir.path().join("dropped.toml"), DROPPED_RULE).expect("rule should write");
    std::fs::write(dir.path().join("pods.toml"), PODS_RULE).expect("rule should write");
}

pub fn build_test_context_with(configure: impl FnOnce(&mut ServerConfig)) -> TestContext {
    let rules_dir = tempfile::tempdir().expect("tempdir should create");
    write_rules(&rules_dir);

    let mut config = ServerConfig {
        rules_dir: rules_dir.path().to_string_lossy().to_string(),
        ..ServerConfig::default()
    };
    configure(&mut config);

    let app = app::build_http_app(AppState::new(config));
    TestContext { rules_dir, app }
}

pub fn build_test_context() -> TestContext {
    build_test_context_with(|_| {})
}

pub fn multipart_body(field: &str, file_name: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
    )
}

/// A `file` upload preceded by plain text form fields.
pub fn multipart_body_with_fields(fields: &[(&str, &str)], file_name: &str, content: &str) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body + &multipart_body("file", file_name, content)
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, req).await
}

pub async fn request_multipart(
    app: &axum::Router,
    uri: &str,
    body: String,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .expect("request should build");
    send(app, req).await
}

pub async fn request_raw(
    app: &axum::Router,
    uri: &str,
    content_type: &str,
    body: &str,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .expect("request should build");
    send(app, req).await
}
