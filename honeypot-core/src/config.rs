use crate::error::Result;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level honeypot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoneypotConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest JSON body accepted on the logging route.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// What gets recorded, and where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Reserved route that records a visit. Every other route serves the decoy.
    #[serde(default = "default_log_path")]
    pub log_path: String,
    /// Append-only JSON-lines file.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Trust every proxy hop when resolving the client address.
    #[serde(default = "default_true")]
    pub trust_proxy: bool,
    /// Decoy document served on every route. `None` = embedded page.
    #[serde(default)]
    pub decoy_page: Option<PathBuf>,
    #[serde(default = "default_summary_chars")]
    pub user_agent_summary_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allow_methods")]
    pub allow_methods: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_credentials: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 3000 }
fn default_max_body_bytes() -> usize { 100 * 1024 }
fn default_log_path() -> String { "/log".into() }
fn default_log_file() -> PathBuf { PathBuf::from("ip_logs.txt") }
fn default_true() -> bool { true }
fn default_summary_chars() -> usize { 50 }
fn default_allow_methods() -> Vec<String> { vec!["GET".into(), "POST".into()] }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            log_file: default_log_file(),
            trust_proxy: true,
            decoy_page: None,
            user_agent_summary_chars: default_summary_chars(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_methods: default_allow_methods(),
            allow_credentials: true,
        }
    }
}

impl HoneypotConfig {
    /// Load configuration: defaults, optional YAML file, `HONEYPOT_` env
    /// overrides (nested keys split on `__`), then bare `PORT`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: HoneypotConfig = figment
            .merge(Env::prefixed("HONEYPOT_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
            .extract()?;
        Ok(config)
    }

    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
