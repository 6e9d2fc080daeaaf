use std::env;
use std::path::PathBuf;

/// Configuration for the HTTP front-end.
///
/// The server is a single-operator tool: the last analyzed base path and the
/// last rendered report are process-wide state by design, see `AppState`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Root scanned when a request carries no explicit path.
    pub default_root: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        ServerConfig {
            port: env_port("SITEVERIF_PORT", 3000),
            default_root: env::var("SITEVERIF_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::current_dir().unwrap_or_else(|_| PathBuf::from("."))),
        }
    }
}

/// Configuration for the file-system relay agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub port: u16,
    /// Front-end base URL used for registration on startup.
    pub server_url: String,
    /// Public URL under which this agent is reachable (tunnel endpoint).
    /// Registration is skipped when unset.
    pub public_url: Option<String>,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        AgentConfig {
            port: env_port("AGENT_PORT", 4000),
            server_url: env::var("SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            public_url: env::var("AGENT_PUBLIC_URL").ok().filter(|u| !u.is_empty()),
        }
    }
}

fn env_port(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
