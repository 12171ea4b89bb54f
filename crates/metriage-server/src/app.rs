use crate::logging::{self, TraceId};
use crate::state::AppState;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use metriage_engine::analyzer::analyze_content;
use metriage_engine::error::EngineError;
use metriage_rules::version::Version;
use metriage_report::{render_console, render_markdown, ColorMode};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

const UPLOAD_FIELD: &str = "file";
const ACS_VERSION_FIELD: &str = "acs_version";
const DEFAULT_UPLOAD_NAME: &str = "metrics.txt";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub markdown: String,
    pub console: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    #[serde(rename = "lastUpdate")]
    pub last_update: String,
}

type AnalyzeReply = (StatusCode, Json<AnalyzeResponse>);

fn error_reply(status: StatusCode, message: impl Into<String>) -> AnalyzeReply {
    (
        status,
        Json(AnalyzeResponse {
            error: message.into(),
            ..AnalyzeResponse::default()
        }),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        last_update: option_env!("METRIAGE_BUILD_TIME")
            .unwrap_or("Unknown")
            .to_string(),
    })
}

/// Fields accepted by `/api/analyze/both`.
struct Upload {
    file_name: String,
    content: String,
    acs_version: Option<String>,
}

fn form_error(e: MultipartError, what: &str) -> AnalyzeReply {
    error_reply(e.status(), format!("{what}: {}", e.body_text()))
}

/// Reads the first `file` field as (file name, UTF-8 content) and the optional
/// `acs_version` text field. Other fields are ignored.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, AnalyzeReply> {
    let mut file = None;
    let mut acs_version = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, "Failed to parse form"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            UPLOAD_FIELD if file.is_none() => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_UPLOAD_NAME)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| form_error(e, "Failed to read upload"))?;
                file = Some((file_name, String::from_utf8_lossy(&bytes).into_owned()));
            }
            ACS_VERSION_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| form_error(e, "Failed to parse form"))?;
                acs_version = Some(text.trim().to_string()).filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    Ok(file.map(|(file_name, content)| Upload {
        file_name,
        content,
        acs_version,
    }))
}

async fn analyze_both(
    State(state): State<AppState>,
    Extension(trace_id): Extension<TraceId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AnalyzeReply {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(e) => {
            return error_reply(
                StatusCode::BAD_REQUEST,
                format!("Failed to parse form: {}", e.body_text()),
            )
        }
    };

    let Upload {
        file_name,
        content,
        acs_version,
    } = match read_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            return error_reply(
                StatusCode::BAD_REQUEST,
                format!("No file uploaded: missing '{UPLOAD_FIELD}' field"),
            )
        }
        Err(reply) => return reply,
    };

    if let Some(raw) = acs_version.as_deref().filter(|v| Version::parse(v).is_none()) {
        return error_reply(
            StatusCode::BAD_REQUEST,
            format!("Invalid '{ACS_VERSION_FIELD}': '{raw}' is not a version like 4.8 or 4.8.2"),
        );
    }

    tracing::info!(trace_id = %trace_id.0, file = %file_name, bytes = content.len(), "Processing upload");

    let mut opts = state.analyze_options();
    opts.acs_version_override = acs_version;
    let task = tokio::task::spawn_blocking(move || {
        analyze_content(&file_name, &content, &opts).map(|report| {
            (
                render_markdown(&report),
                render_console(&report, ColorMode::Plain),
            )
        })
    });

    match tokio::time::timeout(state.config.request_timeout(), task).await {
        Err(_) => error_reply(StatusCode::REQUEST_TIMEOUT, "Request timed out"),
        Ok(Err(e)) => error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Analysis task failed: {e}"),
        ),
        Ok(Ok(Err(e))) => {
            tracing::warn!(trace_id = %trace_id.0, error = %e, "Analysis failed");
            let status = match &e {
                EngineError::InvalidAcsVersion(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_reply(status, format!("Analysis failed: {e}"))
        }
        Ok(Ok(Ok((markdown, console)))) => (
            StatusCode::OK,
            Json(AnalyzeResponse {
                markdown,
                console,
                error: String::new(),
            }),
        ),
    }
}

pub fn build_http_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/api/analyze/both", post(analyze_both))
        .route("/health", get(health))
        .route("/version", get(version))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_file_size))
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging))
}
