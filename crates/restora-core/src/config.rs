//! Configuration module
//!
//! Environment-based configuration for the client: backend base URL, the
//! blob-store endpoint, and where the access token is persisted between
//! runs.

use std::env;
use std::path::PathBuf;

use crate::error::ClientError;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const TOKEN_DIR_NAME: &str = ".restora";
const TOKEN_FILE_NAME: &str = "token";

/// Page size for the job-history listing. Fixed by the backend contract.
pub const JOB_PAGE_SIZE: u32 = 5;

#[derive(Clone, Debug)]
pub struct Config {
    /// Backend base URL (auth, job creation, job listing).
    pub api_base_url: String,
    /// Blob-store upload endpoint. Absolute URL, addressed independently of
    /// the backend; optional because read-only flows never touch it.
    pub store_url: Option<String>,
    /// Where the access token is persisted between runs.
    pub token_path: PathBuf,
}

impl Config {
    /// Read configuration from `RESTORA_API_URL` (or `API_URL`),
    /// `RESTORA_STORE_URL`, and `RESTORA_TOKEN_PATH`.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_base_url = env::var("RESTORA_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let store_url = env::var("RESTORA_STORE_URL").ok();

        let token_path = match env::var("RESTORA_TOKEN_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_token_path()?,
        };

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            store_url,
            token_path,
        })
    }
}

fn default_token_path() -> Result<PathBuf, ClientError> {
    let home = env::var("HOME")
        .map_err(|_| ClientError::Config("HOME is not set; set RESTORA_TOKEN_PATH".to_string()))?;
    Ok(PathBuf::from(home).join(TOKEN_DIR_NAME).join(TOKEN_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var reads are process-global; keep them in one test to avoid
    // interference between parallel tests.
    #[test]
    fn from_env_applies_defaults_and_trims() {
        env::set_var("RESTORA_API_URL", "https://api.example.com/");
        env::set_var("RESTORA_TOKEN_PATH", "/tmp/restora-test-token");
        env::remove_var("RESTORA_STORE_URL");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.store_url, None);
        assert_eq!(config.token_path, PathBuf::from("/tmp/restora-test-token"));

        env::remove_var("RESTORA_API_URL");
        env::remove_var("RESTORA_TOKEN_PATH");
    }
}
