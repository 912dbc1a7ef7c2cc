//! Server configuration.
//!
//! Environment variables are read exactly once, at startup; every service
//! gets the values it needs through its constructor. Nothing else in the
//! crate reads environment variables.

use anyhow::Context;
use std::path::PathBuf;

/// Origin allowed when `CORS_ORIGIN` is unset; also the fallback when the
/// configured value does not parse as a header value.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Canonical absolute path all file operations are confined to.
    pub project_root: PathBuf,
    /// Compiler binary invoked for compile requests.
    pub compiler: String,
    /// Parent directory for per-request scratch dirs (system temp if unset).
    pub scratch_dir: Option<PathBuf>,
    /// Allowed CORS origin for the browser frontend (`*` allows any).
    pub cors_origin: String,
    pub ai: AiConfig,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_url: String,
    /// Absent or empty key means the AI endpoints run degraded.
    pub api_key: Option<String>,
    pub model: String,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let project_root = std::env::var("PROJECT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let project_root = project_root
            .canonicalize()
            .with_context(|| format!("project root {} is not accessible", project_root.display()))?;

        let scratch_dir = match std::env::var("SCRATCH_DIR").ok() {
            Some(dir) if !dir.is_empty() => {
                let dir = PathBuf::from(dir);
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("failed to create scratch dir {}", dir.display()))?;
                Some(dir)
            }
            _ => None,
        };

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3001),
            project_root,
            compiler: env_or("CXX", "g++"),
            scratch_dir,
            cors_origin: env_or("CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
            ai: AiConfig {
                api_url: env_or("AI_API_URL", "https://api.openai.com/v1/chat/completions"),
                api_key: std::env::var("AI_API_KEY").ok().filter(|k| !k.is_empty()),
                model: env_or("AI_MODEL", "gpt-3.5-turbo"),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
