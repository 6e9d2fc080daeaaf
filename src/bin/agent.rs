//! File-system relay agent.
//!
//! Runs next to the operator's files and exposes read-only access to them
//! so a remotely hosted front-end can scan a local folder. The public
//! tunnel URL is supplied by configuration (`AGENT_PUBLIC_URL`) and
//! registered with the front-end on startup.

use axum::extract::Query;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use siteverif::agent_api::{
    AccessResponse, AgentEntry, CopyRequest, CopyResponse, FolderRequest, ListResponse,
    RegisterAgentRequest,
};
use siteverif::config::AgentConfig;

/// The front-end may be served from anywhere; the report UI calls the
/// agent cross-origin.
async fn cors(request: axum::extract::Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    response
}

async fn list_handler(Json(body): Json<FolderRequest>) -> Response {
    if body.folder_path.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Chemin non specifie" })),
        )
            .into_response();
    }
    let path = PathBuf::from(&body.folder_path);
    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    };
    if !meta.is_dir() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Le chemin n'est pas un dossier" })),
        )
            .into_response();
    }

    let mut items = Vec::new();
    match tokio::fs::read_dir(&path).await {
        Ok(mut entries) => {
            while let Ok(Some(entry)) = entries.next_entry().await {
                // Unreadable entries are skipped, not fatal.
                if let Ok(meta) = entry.metadata().await {
                    items.push(AgentEntry {
                        name: entry.file_name().to_string_lossy().to_string(),
                        path: entry.path().to_string_lossy().to_string(),
                        is_directory: meta.is_dir(),
                        size: meta.len(),
                    });
                }
            }
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }

    Json(ListResponse {
        items,
        path: path.to_string_lossy().to_string(),
    })
    .into_response()
}

async fn file_handler(Query(params): Query<HashMap<String, String>>) -> Response {
    let path = match params.get("path").filter(|p| !p.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Chemin non specifie" })),
            )
                .into_response()
        }
    };
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => content.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn access_handler(Json(body): Json<FolderRequest>) -> Response {
    if body.folder_path.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Chemin non specifie" })),
        )
            .into_response();
    }
    let path = PathBuf::from(&body.folder_path);
    match tokio::fs::metadata(&path).await {
        Ok(meta) => Json(AccessResponse {
            accessible: true,
            is_directory: Some(meta.is_dir()),
            path: Some(path.to_string_lossy().to_string()),
            error: None,
        })
        .into_response(),
        Err(e) => Json(AccessResponse {
            accessible: false,
            is_directory: None,
            path: None,
            error: Some(e.to_string()),
        })
        .into_response(),
    }
}

async fn copy_handler(Json(body): Json<CopyRequest>) -> Response {
    if body.source_path.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Chemin non specifie" })),
        )
            .into_response();
    }
    let path = PathBuf::from(&body.source_path);
    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    };
    if meta.is_dir() {
        // The front-end reads directories entry by entry over /api/list.
        return Json(CopyResponse {
            kind: "directory".to_string(),
            path: Some(path.to_string_lossy().to_string()),
            content: None,
        })
        .into_response();
    }
    match tokio::fs::read(&path).await {
        Ok(bytes) => Json(CopyResponse {
            kind: "file".to_string(),
            path: None,
            content: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn register_with_server(config: &AgentConfig) {
    let public_url = match &config.public_url {
        Some(url) => url.clone(),
        None => {
            info!("AGENT_PUBLIC_URL non defini, enregistrement saute");
            return;
        }
    };
    let endpoint = format!(
        "{}/api/register-agent",
        config.server_url.trim_end_matches('/')
    );
    let result = reqwest::Client::new()
        .post(&endpoint)
        .json(&RegisterAgentRequest {
            agent_url: public_url.clone(),
        })
        .send()
        .await;
    match result {
        Ok(response) if response.status().is_success() => {
            info!("agent enregistre aupres du serveur: {}", public_url);
        }
        Ok(response) => {
            warn!("enregistrement refuse par le serveur: {}", response.status());
        }
        Err(e) => {
            warn!("enregistrement impossible (serveur pas encore a jour ?): {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AgentConfig::from_env();
    let addr = format!("0.0.0.0:{}", config.port);

    let app = Router::new()
        .route("/api/list", post(list_handler))
        .route("/api/file", get(file_handler))
        .route("/api/access", post(access_handler))
        .route("/api/copy", post(copy_handler))
        .layer(middleware::from_fn(cors));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
    info!("agent demarre sur le port {}", config.port);
    info!("pret a traiter les requetes sur les fichiers locaux");

    register_with_server(&config).await;

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Agent error: {}", e))
}
