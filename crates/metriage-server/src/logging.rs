use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use std::time::Instant;

pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

/// Longest error message copied from a response body into the log.
const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Per-request id, inserted into request extensions and echoed back in the
/// `X-Trace-Id` response header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    /// 16 lowercase hex characters.
    pub fn generate() -> Self {
        Self(format!("{:016x}", rand::random::<u64>()))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// What to log for a failed request: the `error` field of a JSON body when
/// present, otherwise the leading characters of the body.
fn error_summary(body: &[u8]) -> String {
    let text = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("error") {
            Some(serde_json::Value::String(e)) => e.clone(),
            _ => String::from_utf8_lossy(body).into_owned(),
        },
        _ => String::from_utf8_lossy(body).into_owned(),
    };
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(MAX_LOGGED_ERROR_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn with_trace_header(mut response: Response, trace_id: &TraceId) -> Response {
    if let Ok(value) = HeaderValue::from_str(&trace_id.0) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// Logs one line per request and one per response. Upload bodies and
/// successful responses stream through untouched; only 4xx/5xx JSON bodies are
/// buffered so their error message can be logged.
pub async fn request_logging(mut req: Request, next: Next) -> Response {
    let trace_id = TraceId::generate();
    req.extensions_mut().insert(trace_id.clone());

    tracing::info!(
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
        content_length = header_str(req.headers(), header::CONTENT_LENGTH),
        ua = header_str(req.headers(), header::USER_AGENT),
        "--> request"
    );

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) || !is_json(response.headers()) {
        tracing::info!(
            trace_id = %trace_id,
            status = status.as_u16(),
            elapsed_ms,
            content_length = header_str(response.headers(), header::CONTENT_LENGTH),
            "<-- response"
        );
        return with_trace_header(response, &trace_id);
    }

    let (parts, body) = response.into_parts();
    let bytes: Bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(
                trace_id = %trace_id,
                status = status.as_u16(),
                elapsed_ms,
                error = %e,
                "<-- response body could not be read"
            );
            let reply = (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to produce response body" })),
            );
            return with_trace_header(reply.into_response(), &trace_id);
        }
    };

    let error = error_summary(&bytes);
    if status.is_server_error() {
        tracing::error!(trace_id = %trace_id, status = status.as_u16(), elapsed_ms, error = %error, "<-- response");
    } else {
        tracing::warn!(trace_id = %trace_id, status = status.as_u16(), elapsed_ms, error = %error, "<-- response");
    }

    with_trace_header(Response::from_parts(parts, Body::from(bytes)), &trace_id)
}
