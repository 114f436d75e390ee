//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$BILLDROP_CONFIG` (environment variable)
//! 2. `~/.config/billdrop/config.toml` (Linux/macOS)
//!    `%APPDATA%\billdrop\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search predicate settings.
    pub search: SearchConfig,
    /// Export destination settings.
    pub export: ExportConfig,
    /// Bill scan settings.
    pub scan: ScanConfig,
    /// General behavior settings.
    pub general: GeneralConfig,
}

/// Search predicate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Query in the mail host's native syntax, e.g.
    /// `from:"Jamaica Public Service" has:attachment`.
    ///
    /// Treated as opaque — whatever is here is handed to the query parser
    /// verbatim.
    pub query: String,
}

/// Export destination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Display name of the destination folder created per run.
    pub folder_name: String,
    /// Drive root the destination folders are created under.
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
}

/// Bill scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Invoice template layout: "legacy" or "current".
    pub layout: String,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: "has:attachment".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            folder_name: "Bills".to_string(),
            output_dir: None,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            layout: "current".to_string(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
///
/// Runs before the tracing subscriber is installed (the log level itself
/// comes from here), so failures go to stderr directly.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!(
                            "warning: failed to parse config '{}', using defaults: {e}",
                            path.display()
                        );
                    }
                },
                Err(e) => {
                    eprintln!(
                        "warning: failed to read config '{}', using defaults: {e}",
                        path.display()
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    // 1. Environment variable override
    if let Ok(env_path) = std::env::var("BILLDROP_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    // 2. Standard config directory
    dirs::config_dir().map(|d| d.join("billdrop").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("billdrop")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.search.query, "has:attachment");
        assert_eq!(cfg.export.folder_name, "Bills");
        assert_eq!(cfg.scan.layout, "current");
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.search.query, cfg.search.query);
        assert_eq!(parsed.export.folder_name, cfg.export.folder_name);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[search]
query = "from:\"Jamaica Public Service\" has:attachment"

[export]
folder_name = "JPS Bills"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(
            cfg.search.query,
            "from:\"Jamaica Public Service\" has:attachment"
        );
        assert_eq!(cfg.export.folder_name, "JPS Bills");
        // Other fields use defaults
        assert_eq!(cfg.scan.layout, "current");
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_load_config_falls_back_on_bad_file() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = tmp.path().join("config.toml");
        std::fs::write(&bad, "not [valid toml").unwrap();

        // Only this test touches the env var, so no cross-test interference.
        std::env::set_var("BILLDROP_CONFIG", &bad);
        let cfg = load_config();
        std::env::remove_var("BILLDROP_CONFIG");

        assert_eq!(cfg.search.query, "has:attachment");
        assert_eq!(cfg.export.folder_name, "Bills");
    }
}
