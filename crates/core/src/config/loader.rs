//! Configuration file discovery and loading

use super::schema::Config;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Candidate file names, probed in this order
pub const CONFIG_CANDIDATES: [&str; 4] = [
    "deploid.config.toml",
    "deploid.config.json",
    "deploid.config.json5",
    ".deploidrc.json",
];

/// A configuration together with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

/// Find the first candidate configuration file present in `dir`
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
}

/// Load the configuration for the project rooted at `dir`
pub fn load(dir: &Path) -> Result<LoadedConfig> {
    let path = find_config_file(dir).ok_or_else(|| Error::config_not_found(dir, &CONFIG_CANDIDATES))?;
    tracing::debug!(path = %path.display(), "Loading configuration");

    let config = load_file(&path)?;
    Ok(LoadedConfig { config, path })
}

/// Load and parse a single configuration file
///
/// A top-level `default` table is treated as the configuration itself, so
/// `{ "default": { ... } }` and `{ ... }` are equivalent.
pub fn load_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    let document = parse_document(path, &content)?;
    serde_json::from_value(unwrap_default(document)).map_err(|e| Error::config_parse(path, e))
}

fn parse_document(path: &Path, content: &str) -> Result<serde_json::Value> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if name.ends_with(".toml") {
        let value: toml::Value = toml::from_str(content).map_err(|e| Error::config_parse(path, e))?;
        serde_json::to_value(value).map_err(|e| Error::config_parse(path, e))
    } else if name.ends_with(".json5") {
        json5::from_str(content).map_err(|e| Error::config_parse(path, e))
    } else {
        serde_json::from_str(content).map_err(|e| Error::config_parse(path, e))
    }
}

fn unwrap_default(document: serde_json::Value) -> serde_json::Value {
    match document {
        serde_json::Value::Object(mut map) if map.get("default").is_some_and(|d| d.is_object()) => {
            map.remove("default").unwrap_or_default()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::fs;
    use tempfile::TempDir;

    const TOML_CONFIG: &str = r#"
appName = "From Toml"
appId = "com.x.toml"

[web]
framework = "vite"

[android]
packaging = "capacitor"
"#;

    const JSON_CONFIG: &str = r#"{
  "appName": "From Json",
  "appId": "com.x.json",
  "web": { "framework": "vite" },
  "android": { "packaging": "capacitor" }
}"#;

    #[test]
    fn test_no_candidates_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
        assert!(err.context.unwrap().contains("deploid.config.toml"));
    }

    #[test]
    fn test_single_candidate_loads() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("deploid.config.json"), JSON_CONFIG).unwrap();

        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded.config.app_name, "From Json");
        assert!(loaded.path.ends_with("deploid.config.json"));
    }

    #[test]
    fn test_candidate_order_prefers_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("deploid.config.json"), JSON_CONFIG).unwrap();
        fs::write(dir.path().join("deploid.config.toml"), TOML_CONFIG).unwrap();

        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded.config.app_name, "From Toml");
    }

    #[test]
    fn test_json_before_json5_and_rc() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".deploidrc.json"), JSON_CONFIG.replace("From Json", "From Rc")).unwrap();
        fs::write(
            dir.path().join("deploid.config.json5"),
            "{ appName: 'From Json5', appId: 'com.x.j5', web: { framework: 'vite' }, android: { packaging: 'capacitor' }, }",
        )
        .unwrap();

        assert_eq!(load(dir.path()).unwrap().config.app_name, "From Json5");

        fs::write(dir.path().join("deploid.config.json"), JSON_CONFIG).unwrap();
        assert_eq!(load(dir.path()).unwrap().config.app_name, "From Json");
    }

    #[test]
    fn test_default_export_is_unwrapped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("deploid.config.json"),
            format!("{{ \"default\": {} }}", JSON_CONFIG),
        )
        .unwrap();

        assert_eq!(load(dir.path()).unwrap().config.app_id, "com.x.json");
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("deploid.config.toml"), "appName = ").unwrap();

        let err = load(dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.message.contains("deploid.config.toml"));
    }
}
