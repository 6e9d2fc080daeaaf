use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::agent_api::{AgentFs, RegisterAgentRequest};
use crate::config::ServerConfig;
use crate::fs_access::{resolve_within, LocalFs, SiteFs};
use crate::report::{generate_report, ScanStats};
use crate::scan::{check_sites, find_site_folders};

pub const REPORT_FILE: &str = "structure_report.html";

const PANEL_HTML: &str = include_str!("../assets/panel.html");

/// Process-wide state of the front-end. Last-writer-wins by design: the
/// tool serves a single interactive operator, see `ServerConfig`.
pub struct AppState {
    pub config: ServerConfig,
    pub base_path: Mutex<PathBuf>,
    pub last_report: Mutex<Option<String>>,
    pub agent_url: Mutex<Option<String>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let base_path = config.default_root.clone();
        AppState {
            config,
            base_path: Mutex::new(base_path),
            last_report: Mutex::new(None),
            agent_url: Mutex::new(None),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(panel_handler))
        .route("/api/sites", get(sites_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/report", get(report_handler))
        .route("/api/register-agent", post(register_agent_handler))
        .route("/sites/:site/*path", get(site_file_handler))
        .with_state(state)
}

async fn panel_handler() -> Html<&'static str> {
    Html(PANEL_HTML)
}

async fn sites_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let target = params
        .get("path")
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.default_root.clone());
    if !target.is_dir() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Not a directory: {}", target.display()) })),
        )
            .into_response();
    }
    let sites = tokio::task::spawn_blocking(move || {
        let folders = find_site_folders(&LocalFs, &target);
        (folders, target)
    })
    .await;
    match sites {
        Ok((folders, target)) => Json(json!({
            "sites": folders,
            "count": folders.len(),
            "path": target.to_string_lossy(),
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    #[serde(rename = "folderPath")]
    folder_path: Option<String>,
    #[serde(rename = "agentUrl")]
    agent_url: Option<String>,
}

/// A Windows drive path supplied to a non-Windows deployment cannot be
/// read locally; the registered agent is the way out.
fn is_foreign_windows_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    !cfg!(windows)
        && bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

fn instructional_fragment(target: &str, foreign: bool, agent_tried: bool) -> String {
    let mut html = format!(
        "<div class=\"notice\"><p>Le dossier <code>{}</code> n'est pas accessible depuis le serveur.</p>",
        target
    );
    if foreign {
        html.push_str(
            "<p>Ce chemin se trouve sur votre machine. Lancez l'agent local \
             (<code>agent</code>, port 4000) : il s'enregistre aupres du serveur et \
             donne acces au dossier.</p>",
        );
    }
    if agent_tried {
        html.push_str("<p>L'agent enregistre n'a pas pu acceder a ce chemin non plus.</p>");
    }
    html.push_str("</div>");
    html
}

struct AnalysisOutcome {
    report: String,
    stats: ScanStats,
}

/// Run the batch scan on the blocking pool: local disk when the path is
/// readable, the agent RPC otherwise.
fn run_analysis(target: &str, agent_url: Option<&str>) -> Result<AnalysisOutcome, String> {
    let target_path = PathBuf::from(target);
    let foreign = is_foreign_windows_path(target);

    let (fs, local): (Box<dyn SiteFs>, bool) = if !foreign && target_path.is_dir() {
        (Box::new(LocalFs), true)
    } else if let Some(url) = agent_url {
        let agent = AgentFs::new(url)?;
        if agent.is_dir(&target_path) {
            (Box::new(agent), false)
        } else {
            return Err(instructional_fragment(target, foreign, true));
        }
    } else {
        return Err(instructional_fragment(target, foreign, false));
    };

    let results = check_sites(fs.as_ref(), &target_path);
    let (report, stats) = generate_report(&results, &target_path, true);

    // Keep the artifact on disk where the deployment allows it; the
    // in-memory copy held by the caller is authoritative either way.
    if local {
        if let Err(e) = std::fs::write(target_path.join(REPORT_FILE), &report) {
            info!("report not written to scan root: {}", e);
        }
    }
    if let Err(e) = std::fs::write(std::env::temp_dir().join(REPORT_FILE), &report) {
        info!("report not written to temp dir: {}", e);
    }

    Ok(AnalysisOutcome { report, stats })
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> Response {
    let target = body
        .folder_path
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| state.config.default_root.to_string_lossy().to_string());
    *state.base_path.lock().unwrap() = PathBuf::from(&target);

    let agent_url = body
        .agent_url
        .or_else(|| state.agent_url.lock().unwrap().clone());

    info!("analyzing {} (agent: {})", target, agent_url.is_some());
    let outcome = {
        let target = target.clone();
        tokio::task::spawn_blocking(move || run_analysis(&target, agent_url.as_deref())).await
    };

    match outcome {
        Ok(Ok(outcome)) => {
            *state.last_report.lock().unwrap() = Some(outcome.report.clone());
            Json(json!({
                "success": true,
                "output": outcome.stats.output,
                "error": "",
                "report": outcome.report,
                "stats": outcome.stats,
            }))
            .into_response()
        }
        Ok(Err(fragment)) => {
            let empty = ScanStats::from_results(&[]);
            Json(json!({
                "success": false,
                "output": "",
                "error": format!("Path not accessible: {}", target),
                "report": fragment,
                "stats": empty,
            }))
            .into_response()
        }
        Err(e) => {
            error!("analysis task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                    "output": "",
                    "stderr": format!("{:?}", e),
                })),
            )
                .into_response()
        }
    }
}

async fn report_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // In-memory copy first: it survives read-only deployments.
    if let Some(report) = state.last_report.lock().unwrap().clone() {
        return Html(report).into_response();
    }

    let base_path = params
        .get("basePath")
        .map(PathBuf::from)
        .unwrap_or_else(|| state.base_path.lock().unwrap().clone());
    for candidate in [
        base_path.join(REPORT_FILE),
        std::env::temp_dir().join(REPORT_FILE),
    ] {
        if let Ok(report) = tokio::fs::read_to_string(&candidate).await {
            return Html(report).into_response();
        }
    }

    (
        StatusCode::NOT_FOUND,
        Html("<p>Rapport introuvable. Lancez une analyse d'abord.</p>".to_string()),
    )
        .into_response()
}

async fn register_agent_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterAgentRequest>,
) -> Response {
    info!("agent registered: {}", body.agent_url);
    *state.agent_url.lock().unwrap() = Some(body.agent_url);
    Json(json!({ "success": true })).into_response()
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Serve one file of one site for the report's preview frame.
async fn site_file_handler(
    State(state): State<Arc<AppState>>,
    UrlPath((site, file_path)): UrlPath<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let base_path = params
        .get("basePath")
        .map(PathBuf::from)
        .unwrap_or_else(|| state.base_path.lock().unwrap().clone());

    let relative = format!("{}/{}", site, file_path);
    let full_path = match resolve_within(&base_path, &relative) {
        Some(path) => path,
        None => return (StatusCode::FORBIDDEN, "Forbidden").into_response(),
    };

    match tokio::fs::read(&full_path).await {
        Ok(bytes) => {
            let mut response = Response::new(bytes.into());
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type_for(&full_path)),
            );
            // The report embeds site pages in iframes from any origin.
            headers.insert("X-Frame-Options", HeaderValue::from_static("ALLOWALL"));
            headers.insert(
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static("frame-ancestors *"),
            );
            response
        }
        Err(e) => {
            info!("file not served: {}: {}", full_path.display(), e);
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_windows_path() {
        assert!(is_foreign_windows_path("C:\\Users\\me\\sites"));
        assert!(is_foreign_windows_path("d:/sites"));
        assert!(!is_foreign_windows_path("/home/me/sites"));
        assert!(!is_foreign_windows_path("sites"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(
            content_type_for(Path::new("a/index.HTML")),
            "text/html; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("img/x.webp")), "image/webp");
        assert_eq!(
            content_type_for(Path::new("noext")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_instructional_fragment_mentions_agent() {
        let fragment = instructional_fragment("C:\\sites", true, false);
        assert!(fragment.contains("agent"));
        assert!(fragment.contains("C:\\sites"));
    }
}
