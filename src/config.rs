use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::ApiClient;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API root, e.g. "http://localhost:8000/api"
    pub api_url: String,
    /// Per-request timeout. Ranking runs an LLM over every candidate, so
    /// this is generous.
    pub timeout: Duration,
    pub log_file: PathBuf,
    pub log_stderr: bool,
}

impl Config {
    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.api_url, self.timeout)
            .with_context(|| format!("Failed to build HTTP client for {}", self.api_url))
    }

    pub fn default_log_path() -> PathBuf {
        // XDG data directory, or the working directory as a fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "scout") {
            proj_dirs.data_dir().join("scout.log")
        } else {
            PathBuf::from("scout.log")
        }
    }
}
