use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Directory holding local identity, caches and (for the local backend)
    /// the emulated store. Relative paths resolve against the config file.
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,

    #[error("missing required setting '{0}'")]
    MissingSetting(&'static str),

    #[error("invalid setting '{setting}': {message}")]
    InvalidSetting {
        setting: &'static str,
        message: String,
    },
}

impl Config {
    /// Load the config file, falling back to defaults when it does not exist.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }

    /// Resolved workspace directory for a config loaded from `config_path`.
    pub fn workspace_dir(&self, config_path: &Path) -> PathBuf {
        let raw = self
            .workspace
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_WORKSPACE));
        resolve_path(config_path, raw)
    }
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths are returned as-is.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Default Paths
// ============================================================================

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "cloudsave.yaml";
/// Default workspace directory (relative to config file).
pub const DEFAULT_WORKSPACE: &str = ".cloudsave";
/// Local backend record directory (relative to workspace).
pub const DEFAULT_DATA_DIR: &str = "data";
/// Local backend blob directory (relative to workspace).
pub const DEFAULT_FILES_DIR: &str = "files";

// ============================================================================
// Backend
// ============================================================================

/// Which backend the façade talks to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Emulate the service inside the workspace.
    #[default]
    Local,
    /// Use the remote HTTP service configured under `remote`.
    Remote,
}

#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            environment: None,
            auth_url: None,
            api_url: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl RemoteConfig {
    /// Project id, rejecting a missing or blank value.
    pub fn require_project_id(&self) -> Result<&str, ConfigError> {
        require(self.project_id.as_deref(), "remote.project_id")
    }

    pub fn require_auth_url(&self) -> Result<&str, ConfigError> {
        require(self.auth_url.as_deref(), "remote.auth_url")
    }

    pub fn require_api_url(&self) -> Result<&str, ConfigError> {
        require(self.api_url.as_deref(), "remote.api_url")
    }

    /// Environment name, treating a blank value as unset.
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref().filter(|e| !e.trim().is_empty())
    }
}

fn require<'a>(value: Option<&'a str>, setting: &'static str) -> Result<&'a str, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingSetting(setting)),
    }
}

fn default_request_timeout() -> u64 {
    30
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variable references in the raw config text.
///
/// - `${VAR}` - required, errors if unset
/// - `${VAR:-default}` - falls back to `default` (may be empty)
/// - `$$` - literal `$`
///
/// A `$` followed by anything else is kept as is. Nested references are not
/// supported.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('{') {
            let end = tail.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            out.push_str(&lookup_var(&tail[..end])?);
            rest = &tail[end + 1..];
        } else {
            out.push('$');
            rest = after;
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Resolve the inside of a `${...}` reference.
fn lookup_var(reference: &str) -> Result<String, ConfigError> {
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match std::env::var(name) {
        Ok(value) => Ok(value),
        Err(_) => default
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    // ========================================================================
    // Config Tests
    // ========================================================================

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.workspace.is_none());
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.remote.request_timeout_seconds, 30);
        assert!(config.remote.project_id.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let config = Config::load(tmp_dir.path().join("missing.yaml"))
            .await
            .unwrap();
        assert_eq!(config.backend, BackendKind::Local);
    }

    #[tokio::test]
    async fn test_load_remote_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
workspace: /var/lib/cloudsave
backend: remote
remote:
  project_id: "proj-123"
  environment: staging
  auth_url: "https://auth.example.com"
  api_url: "https://api.example.com"
  request_timeout_seconds: 5
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.backend, BackendKind::Remote);
        assert_eq!(config.workspace, Some(PathBuf::from("/var/lib/cloudsave")));
        assert_eq!(config.remote.require_project_id().unwrap(), "proj-123");
        assert_eq!(config.remote.environment(), Some("staging"));
        assert_eq!(
            config.remote.require_api_url().unwrap(),
            "https://api.example.com"
        );
        assert_eq!(config.remote.request_timeout_seconds, 5);
    }

    #[tokio::test]
    async fn test_load_partial_remote_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
remote:
  project_id: "proj-123"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.remote.request_timeout_seconds, 30);
        assert!(matches!(
            config.remote.require_auth_url(),
            Err(ConfigError::MissingSetting("remote.auth_url"))
        ));
    }

    #[tokio::test]
    async fn test_load_invalid_backend_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "backend: carrier-pigeon").unwrap();

        let result = Config::load(file.path()).await;
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_blank_settings_are_missing() {
        let remote = RemoteConfig {
            project_id: Some("  ".to_string()),
            environment: Some(String::new()),
            ..Default::default()
        };
        assert!(remote.require_project_id().is_err());
        assert!(remote.environment().is_none());
    }

    #[test]
    fn test_workspace_dir_resolves_relative_to_config() {
        let config = Config::default();
        let dir = config.workspace_dir(Path::new("/etc/game/cloudsave.yaml"));
        assert_eq!(dir, PathBuf::from("/etc/game/.cloudsave"));
    }

    #[test]
    fn test_resolve_path_keeps_absolute() {
        let resolved = resolve_path(Path::new("/etc/cloudsave.yaml"), Path::new("/data"));
        assert_eq!(resolved, PathBuf::from("/data"));
    }

    // ========================================================================
    // Environment Variable Expansion Tests
    // ========================================================================

    #[test]
    fn test_expand_env_vars_no_vars() {
        let input = "plain: value\nprice: $100";
        assert_eq!(expand_env_vars(input).unwrap(), input);
    }

    #[test]
    fn test_expand_env_vars_required_var() {
        // SAFETY: Single-threaded test
        unsafe { std::env::set_var("CLOUDSAVE_TEST_PROJECT", "proj-9") };
        let result = expand_env_vars("project_id: ${CLOUDSAVE_TEST_PROJECT}").unwrap();
        assert_eq!(result, "project_id: proj-9");
        unsafe { std::env::remove_var("CLOUDSAVE_TEST_PROJECT") };
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("CLOUDSAVE_TEST_MISSING_12345") };
        let result = expand_env_vars("value: ${CLOUDSAVE_TEST_MISSING_12345}");
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "CLOUDSAVE_TEST_MISSING_12345")
        );
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("CLOUDSAVE_TEST_UNSET_DEFAULT") };
        let result = expand_env_vars("env: ${CLOUDSAVE_TEST_UNSET_DEFAULT:-production}").unwrap();
        assert_eq!(result, "env: production");
    }

    #[test]
    fn test_expand_env_vars_with_empty_default() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("CLOUDSAVE_TEST_UNSET_EMPTY") };
        let result = expand_env_vars("env: ${CLOUDSAVE_TEST_UNSET_EMPTY:-}").unwrap();
        assert_eq!(result, "env: ");
    }

    #[test]
    fn test_expand_env_vars_escaped_dollar() {
        let result = expand_env_vars("literal: $${NOT_EXPANDED}").unwrap();
        assert_eq!(result, "literal: ${NOT_EXPANDED}");
    }

    #[test]
    fn test_expand_env_vars_unclosed() {
        let result = expand_env_vars("value: ${UNCLOSED");
        assert!(matches!(result, Err(ConfigError::UnclosedVarReference)));
    }
}
