use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::fs_access::{FsEntry, SiteFs};

/// Wire types shared by the agent process and its client.
///
/// The agent grants read access to its whole filesystem to whoever holds
/// its URL; the client side stays capability-scoped (list/read/access/copy)
/// so the trust boundary is explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderRequest {
    #[serde(rename = "folderPath")]
    pub folder_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "isDirectory")]
    pub is_directory: bool,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub items: Vec<AgentEntry>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessResponse {
    pub accessible: bool,
    #[serde(rename = "isDirectory", skip_serializing_if = "Option::is_none")]
    pub is_directory: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyRequest {
    #[serde(rename = "sourcePath")]
    pub source_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64 file content when `kind` is `"file"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl CopyResponse {
    pub fn decode_content(&self) -> Result<Vec<u8>, String> {
        let content = self.content.as_deref().ok_or("No content in response")?;
        base64::engine::general_purpose::STANDARD
            .decode(content)
            .map_err(|e| format!("Invalid base64 payload: {}", e))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    #[serde(rename = "agentUrl")]
    pub agent_url: String,
}

/// Blocking RPC client for one agent.
pub struct AgentClient {
    base: Url,
    client: reqwest::blocking::Client,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let base = Url::parse(base_url).map_err(|e| format!("Invalid agent URL: {}", e))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(AgentClient { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, String> {
        self.base
            .join(path)
            .map_err(|e| format!("Invalid agent endpoint: {}", e))
    }

    pub fn list(&self, folder_path: &str) -> Result<ListResponse, String> {
        let response = self
            .client
            .post(self.endpoint("/api/list")?)
            .json(&FolderRequest {
                folder_path: folder_path.to_string(),
            })
            .send()
            .map_err(|e| format!("Agent list request failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("Agent list error: {}", response.status()));
        }
        response
            .json()
            .map_err(|e| format!("Invalid agent list response: {}", e))
    }

    pub fn file_text(&self, path: &str) -> Result<String, String> {
        let mut url = self.endpoint("/api/file")?;
        url.query_pairs_mut().append_pair("path", path);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| format!("Agent file request failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("Agent file error: {}", response.status()));
        }
        response
            .text()
            .map_err(|e| format!("Failed to read agent response: {}", e))
    }

    pub fn access(&self, folder_path: &str) -> Result<AccessResponse, String> {
        let response = self
            .client
            .post(self.endpoint("/api/access")?)
            .json(&FolderRequest {
                folder_path: folder_path.to_string(),
            })
            .send()
            .map_err(|e| format!("Agent access request failed: {}", e))?;
        response
            .json()
            .map_err(|e| format!("Invalid agent access response: {}", e))
    }

    pub fn copy(&self, source_path: &str) -> Result<CopyResponse, String> {
        let response = self
            .client
            .post(self.endpoint("/api/copy")?)
            .json(&CopyRequest {
                source_path: source_path.to_string(),
            })
            .send()
            .map_err(|e| format!("Agent copy request failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("Agent copy error: {}", response.status()));
        }
        response
            .json()
            .map_err(|e| format!("Invalid agent copy response: {}", e))
    }
}

/// `SiteFs` backed by a remote agent: the scanner runs unchanged against a
/// folder on the operator's machine.
pub struct AgentFs {
    client: AgentClient,
}

impl AgentFs {
    pub fn new(agent_url: &str) -> Result<Self, String> {
        Ok(AgentFs {
            client: AgentClient::new(agent_url)?,
        })
    }

    fn access_of(&self, path: &Path) -> Option<AccessResponse> {
        self.client.access(&path.to_string_lossy()).ok()
    }
}

impl SiteFs for AgentFs {
    fn read_to_string(&self, path: &Path) -> Result<String, String> {
        self.client.file_text(&path.to_string_lossy())
    }

    fn exists(&self, path: &Path) -> bool {
        self.access_of(path).map_or(false, |a| a.accessible)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.access_of(path)
            .map_or(false, |a| a.accessible && a.is_directory == Some(true))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.access_of(path)
            .map_or(false, |a| a.accessible && a.is_directory == Some(false))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<FsEntry>, String> {
        let listing = self.client.list(&path.to_string_lossy())?;
        let mut entries: Vec<FsEntry> = listing
            .items
            .into_iter()
            .map(|item| FsEntry {
                name: item.name,
                path: PathBuf::from(item.path),
                is_dir: item.is_directory,
                size: item.size,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_string(&FolderRequest {
            folder_path: "C:\\sites".to_string(),
        })
        .unwrap();
        assert!(json.contains("folderPath"));

        let entry: AgentEntry = serde_json::from_str(
            r#"{"name":"SiteA","path":"/tmp/SiteA","isDirectory":true,"size":0}"#,
        )
        .unwrap();
        assert!(entry.is_directory);
    }

    #[test]
    fn test_access_response_error_shape() {
        let access: AccessResponse =
            serde_json::from_str(r#"{"accessible":false,"error":"ENOENT"}"#).unwrap();
        assert!(!access.accessible);
        assert_eq!(access.error.as_deref(), Some("ENOENT"));
        assert_eq!(access.is_directory, None);
    }

    #[test]
    fn test_copy_response_roundtrip() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"<html></html>");
        let copy = CopyResponse {
            kind: "file".to_string(),
            path: None,
            content: Some(encoded),
        };
        assert_eq!(copy.decode_content().unwrap(), b"<html></html>");

        let json = serde_json::to_string(&copy).unwrap();
        let back: CopyResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, "file");
    }
}
