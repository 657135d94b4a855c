//! `deploid init`: write a starter `deploid.config.toml`

use deploid_core::{config, Error, Logger, Result};
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "deploid.config.toml";

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub framework: String,
    pub engine: String,
    pub name: Option<String>,
    pub app_id: Option<String>,
    pub force: bool,
}

pub fn run(cwd: &Path, options: &InitOptions, logger: &Logger) -> Result<()> {
    if let Some(existing) = config::find_config_file(cwd) {
        if !options.force {
            return Err(Error::config(format!(
                "{} already exists",
                existing.display()
            ))
            .with_suggestion("Pass --force to overwrite it"));
        }
        logger.warn(format!("Overwriting {}", existing.display()));
    }

    let preset = deploid_web::preset(&options.framework).ok_or_else(|| {
        Error::validation(format!("Unknown framework '{}'", options.framework)).with_suggestion(
            format!(
                "Choose one of: {}",
                deploid_web::presets::frameworks().collect::<Vec<_>>().join(", ")
            ),
        )
    })?;

    let app_name = match &options.name {
        Some(name) => name.clone(),
        None => project_name(cwd),
    };
    let app_id = options
        .app_id
        .clone()
        .unwrap_or_else(|| format!("com.example.{}", slug(&app_name)));

    let text = render(&Template {
        app_name: &app_name,
        app_id: &app_id,
        framework: preset.framework,
        build_command: preset.build_command,
        web_dir: preset.web_dir,
        engine: &options.engine.to_ascii_lowercase(),
    });
    let path = cwd.join(CONFIG_FILE);
    fs::write(&path, text)?;

    logger.success(format!("Wrote {}", path.display()));
    logger.info("Put your logo at assets/logo.svg, then run `deploid package`");
    Ok(())
}

/// `name` from package.json, else the directory name
fn project_name(cwd: &Path) -> String {
    let from_package = fs::read_to_string(cwd.join("package.json"))
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
        .and_then(|json| json.get("name").and_then(|n| n.as_str()).map(str::to_string))
        // npm scopes are not part of the display name
        .map(|name| match name.rsplit_once('/') {
            Some((_, bare)) => bare.to_string(),
            None => name,
        })
        .filter(|name| !name.is_empty());

    from_package
        .or_else(|| cwd.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "app".to_string())
}

/// Lowercase alphanumerics, usable as the last application id segment
fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match slug.chars().next() {
        None => "app".to_string(),
        Some(first) if first.is_ascii_digit() => format!("app{}", slug),
        Some(_) => slug,
    }
}

struct Template<'a> {
    app_name: &'a str,
    app_id: &'a str,
    framework: &'a str,
    build_command: &'a str,
    web_dir: &'a str,
    engine: &'a str,
}

fn quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

fn render(t: &Template) -> String {
    format!(
        r#"# deploid configuration
# Run `deploid package` to generate the Android project.

appName = {app_name}
appId = {app_id}

# What to do when an optional input such as the logo is missing:
# "warnAndSkip" or "abort"
onMissingInput = "warnAndSkip"

[web]
framework = {framework}
buildCommand = {build_command}
webDir = {web_dir}

[android]
packaging = {engine}
minSdk = 22
targetSdk = 34
# permissions = ["CAMERA", "ACCESS_FINE_LOCATION"]
# versionCode = 1
# versionName = "1.0.0"

# [android.signing]
# keystore = "~/keys/release.jks"
# alias = "release"
# Passwords are read from DEPLOID_KEYSTORE_PASSWORD and DEPLOID_KEY_PASSWORD.

[android.build]
release = false
bundle = false

[assets]
source = "assets/logo.svg"
output = "assets-gen"

# [ios]
# teamId = "ABCDE12345"
# deploymentTarget = "13.0"

# [firebase]
# projectId = "my-project"

# [publish]
# track = "internal"
# repo = "owner/name"
"#,
        app_name = quote(t.app_name),
        app_id = quote(t.app_id),
        framework = quote(t.framework),
        build_command = quote(t.build_command),
        web_dir = quote(t.web_dir),
        engine = quote(t.engine),
    )
}
