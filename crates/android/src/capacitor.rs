//! capacitor.config.json as structured JSON
//!
//! Keys deploid does not manage are preserved along with their order.

use crate::tools::Tool;
use deploid_core::config::Config;
use deploid_core::{Context, Error, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// File name, relative to the project root
pub const CAPACITOR_CONFIG: &str = "capacitor.config.json";

/// Read the config file, `None` when absent
pub fn read_config(path: &Path) -> Result<Option<Value>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content).map_err(|e| Error::config_parse(path, e))?;
    Ok(Some(value))
}

/// Write pretty-printed JSON with a trailing newline
pub fn write_config(path: &Path, value: &Value) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

/// Merge deploid's settings into an existing document
pub fn merged_config(existing: Option<Value>, config: &Config) -> Value {
    let mut root = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    root.insert("appId".into(), json!(config.app_id));
    root.insert("appName".into(), json!(config.app_name));
    root.insert(
        "webDir".into(),
        json!(config.web.web_dir.to_string_lossy().replace('\\', "/")),
    );

    let display = &config.android.display;
    if let Some(color) = &display.background_color {
        object_entry(&mut root, "android").insert("backgroundColor".into(), json!(color));
    }

    let launch = &config.android.launch;
    if launch.splash_duration_ms.is_some() || launch.show_spinner {
        let plugins = object_entry(&mut root, "plugins");
        let splash = object_entry(plugins, "SplashScreen");
        if let Some(ms) = launch.splash_duration_ms {
            splash.insert("launchShowDuration".into(), json!(ms));
        }
        splash.insert("showSpinner".into(), json!(launch.show_spinner));
        if let Some(color) = &display.background_color {
            splash.insert("backgroundColor".into(), json!(color));
        }
    }

    Value::Object(root)
}

/// Turn on WebView remote debugging and verbose bridge logging
pub fn enable_debugging(value: &mut Value) {
    if !value.is_object() {
        *value = json!({});
    }
    if let Value::Object(root) = value {
        object_entry(root, "android").insert("webContentsDebuggingEnabled".into(), json!(true));
        root.insert("loggingBehavior".into(), json!("debug"));
    }
}

fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map.entry(key.to_string()).or_insert_with(|| json!({}));
    if !slot.is_object() {
        *slot = json!({});
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just replaced with an object"),
    }
}

/// `cap add <platform>`
pub async fn add_platform(ctx: &Context, cap: &Tool, platform: &str) -> Result<()> {
    ctx.logger.info(format!("Adding {} platform", platform));
    ctx.run(cap.command().arg("add").arg(platform)).await
}

/// `cap sync <platform>`
pub async fn sync(ctx: &Context, cap: &Tool, platform: &str) -> Result<()> {
    ctx.logger.info(format!("Syncing web assets into {}", platform));
    ctx.run(cap.command().arg("sync").arg(platform)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploid_core::testing::{config_from, demo_config, demo_config_json};
    use tempfile::TempDir;

    #[test]
    fn test_merge_into_empty() {
        let value = merged_config(None, &demo_config());
        assert_eq!(
            value,
            json!({ "appId": "com.x.demo", "appName": "Demo", "webDir": "dist" })
        );
    }

    #[test]
    fn test_merge_keeps_unmanaged_keys() {
        let existing = json!({
            "appId": "old.id",
            "server": { "androidScheme": "https" },
            "plugins": { "Keyboard": { "resize": "body" } }
        });
        let mut json = demo_config_json();
        json["android"]["launch"] = json!({ "splashDurationMs": 1500, "showSpinner": true });
        json["android"]["display"] = json!({ "backgroundColor": "#101010" });

        let value = merged_config(Some(existing), &config_from(json));
        assert_eq!(value["appId"], "com.x.demo");
        assert_eq!(value["server"]["androidScheme"], "https");
        assert_eq!(value["plugins"]["Keyboard"]["resize"], "body");
        assert_eq!(value["plugins"]["SplashScreen"]["launchShowDuration"], 1500);
        assert_eq!(value["plugins"]["SplashScreen"]["showSpinner"], true);
        assert_eq!(value["android"]["backgroundColor"], "#101010");

        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys[0], "appId");
        assert_eq!(keys[1], "server");
    }

    #[test]
    fn test_enable_debugging_replaces_non_object_android() {
        let mut value = json!({ "appId": "a", "android": "oops" });
        enable_debugging(&mut value);
        assert_eq!(value["android"]["webContentsDebuggingEnabled"], true);
        assert_eq!(value["loggingBehavior"], "debug");
        assert_eq!(value["appId"], "a");
    }

    #[test]
    fn test_read_write_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CAPACITOR_CONFIG);
        assert!(read_config(&path).unwrap().is_none());

        let value = merged_config(None, &demo_config());
        write_config(&path, &value).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("  \"appId\": \"com.x.demo\""));
        assert_eq!(read_config(&path).unwrap(), Some(value));
    }

    #[test]
    fn test_invalid_json_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CAPACITOR_CONFIG);
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(err.message.contains(CAPACITOR_CONFIG));
    }
}
