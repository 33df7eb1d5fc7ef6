use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::warn;

use summ_llm::ModelConfig;
use summ_llm::inference::DEFAULT_MODEL_ENDPOINT;

/// Session secrets that only make sense on a developer machine.
const PLACEHOLDER_SECRETS: &[&str] = &["dev", "change-me", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub http_timeout: Duration,
    pub model_endpoint: String,
    pub model_token: Option<String>,
}

impl Config {
    /// Reads `SUMM_*` variables from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let secret_key = var("SUMM_SECRET_KEY", "dev");
        if PLACEHOLDER_SECRETS.contains(&secret_key.as_str()) {
            warn!("SUMM_SECRET_KEY is a placeholder; sessions can be forged. Set it before deploying.");
        }

        let port = var("SUMM_PORT", "5000")
            .parse()
            .context("SUMM_PORT must be a port number")?;
        let timeout_secs: u64 = var("SUMM_HTTP_TIMEOUT_SECS", "15")
            .parse()
            .context("SUMM_HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            secret_key,
            db_path: var("SUMM_DB_PATH", "instance/summ.sqlite").into(),
            host: var("SUMM_HOST", "0.0.0.0"),
            port,
            http_timeout: Duration::from_secs(timeout_secs),
            model_endpoint: var("SUMM_MODEL_ENDPOINT", DEFAULT_MODEL_ENDPOINT),
            model_token: lookup("SUMM_MODEL_TOKEN").filter(|t| !t.is_empty()),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn model(&self) -> ModelConfig {
        ModelConfig {
            endpoint: self.model_endpoint.clone(),
            token: self.model_token.clone(),
            ..ModelConfig::default()
        }
    }
}
