use crate::core::credentials::{CredentialProvider, EnvToken, FileToken, MissingToken, StaticToken};
use crate::core::fund::ActiveTab;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TOKEN_ENV: &str = "FUNDMATCH_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where the bearer token comes from. The first configured source wins, in
/// the order `token`, `token_file`, `token_env`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub token_file: Option<String>,
    pub token_env: Option<String>,
}

impl AuthConfig {
    pub fn credential_provider(&self) -> Arc<dyn CredentialProvider> {
        if let Some(token) = &self.token {
            debug!("Using token from configuration");
            return Arc::new(StaticToken::new(token));
        }
        if let Some(path) = &self.token_file {
            debug!("Using token file {}", path);
            return Arc::new(FileToken::new(path));
        }
        let var = self.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
        if std::env::var_os(var).is_some() {
            debug!("Using token from environment variable {}", var);
            return Arc::new(EnvToken::new(var));
        }
        debug!("No credential source available");
        Arc::new(MissingToken)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub default_tab: ActiveTab,
    pub report_dir: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "fundmatch", "fundmatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn report_dir(&self) -> PathBuf {
        self.report_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
gateway:
  base_url: "http://example.com/api"
  timeout_secs: 5
auth:
  token: "abc"
default_tab: favorites
report_dir: "/tmp/reports"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.gateway.base_url, "http://example.com/api");
        assert_eq!(config.gateway.timeout(), Duration::from_secs(5));
        assert_eq!(config.auth.token.as_deref(), Some("abc"));
        assert_eq!(config.default_tab, ActiveTab::Favorites);
        assert_eq!(config.report_dir(), PathBuf::from("/tmp/reports"));
        assert_eq!(
            config.auth.credential_provider().bearer_token().unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.gateway.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.default_tab, ActiveTab::All);
        assert!(config.report_dir.is_none());
        assert_eq!(config.report_dir(), PathBuf::from("."));

        let partial: AppConfig = serde_yaml::from_str(
            r#"
gateway:
  base_url: "http://localhost:9000"
"#,
        )
        .unwrap();
        assert_eq!(partial.gateway.timeout_secs, 30);
    }

    #[test]
    fn test_token_file_takes_precedence_over_env() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "from-file").unwrap();

        let auth = AuthConfig {
            token: None,
            token_file: Some(file.path().display().to_string()),
            token_env: Some("FUNDMATCH_TEST_TOKEN_THAT_IS_NEVER_SET".to_string()),
        };
        assert_eq!(
            auth.credential_provider().bearer_token().unwrap(),
            "from-file"
        );
    }

    #[test]
    fn test_unset_env_yields_missing_token() {
        let auth = AuthConfig {
            token_env: Some("FUNDMATCH_TEST_TOKEN_THAT_IS_NEVER_SET".to_string()),
            ..Default::default()
        };
        assert!(
            auth.credential_provider()
                .bearer_token()
                .unwrap_err()
                .requires_login()
        );
    }

    #[test]
    fn test_load_from_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "default_tab: recommendations\n").unwrap();
        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.default_tab, ActiveTab::Recommendations);

        let err = AppConfig::load_from_path("/nonexistent/fundmatch.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
