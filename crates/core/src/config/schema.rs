//! Configuration schema definitions
//!
//! Keys are camelCase in every supported file format. `appName`, `appId`,
//! `web.framework` and `android.packaging` have no defaults, so a file that
//! omits them fails to load.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Human-readable application name
    pub app_name: String,

    /// Reverse-domain application identifier
    pub app_id: String,

    /// What steps do when an optional input file is absent
    #[serde(default)]
    pub on_missing_input: MissingInputPolicy,

    pub web: WebConfig,

    pub android: AndroidConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firebase: Option<FirebaseConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishConfig>,
}

/// Missing optional input handling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingInputPolicy {
    /// Fail the step
    Abort,
    /// Log a warning and continue without the input
    #[default]
    WarnAndSkip,
}

/// Web build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebConfig {
    /// Framework tag (vite, next, react, ...)
    pub framework: String,

    /// Shell command producing the web build
    #[serde(default = "default_build_command")]
    pub build_command: String,

    /// Build output directory, relative to the project root
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,
}

fn default_build_command() -> String {
    "npm run build".to_string()
}

fn default_web_dir() -> PathBuf {
    PathBuf::from("dist")
}

/// Native wrapper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    /// Packaging engine tag (capacitor, tauri, twa, ...)
    pub packaging: String,

    #[serde(default = "default_min_sdk")]
    pub min_sdk: u32,

    #[serde(default = "default_target_sdk")]
    pub target_sdk: u32,

    /// Defaults to `target_sdk`
    #[serde(default)]
    pub compile_sdk: Option<u32>,

    /// Short (`CAMERA`) or fully qualified permission names
    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default)]
    pub version_code: Option<u32>,

    #[serde(default)]
    pub version_name: Option<String>,

    #[serde(default)]
    pub signing: Option<SigningConfig>,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub launch: LaunchConfig,

    #[serde(default)]
    pub build: BuildOptions,

    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Default adb serial for device steps
    #[serde(default)]
    pub device: Option<String>,
}

fn default_min_sdk() -> u32 {
    22
}

fn default_target_sdk() -> u32 {
    34
}

impl AndroidConfig {
    /// Compile SDK, falling back to the target SDK
    pub fn compile_sdk(&self) -> u32 {
        self.compile_sdk.unwrap_or(self.target_sdk)
    }
}

/// Release signing material; passwords come from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningConfig {
    /// Keystore path, `~` and `$VAR` are expanded
    pub keystore: String,
    pub alias: String,
}

/// Display options applied to the launch activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// `portrait`, `landscape` or unset
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default)]
    pub background_color: Option<String>,
}

/// Splash screen options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    #[serde(default)]
    pub splash_duration_ms: Option<u32>,
    #[serde(default)]
    pub show_spinner: bool,
}

/// Default build flavour, overridable on the command line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    #[serde(default)]
    pub release: bool,
    /// Produce an app bundle (AAB) instead of an APK
    #[serde(default)]
    pub bundle: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceConfig {
    #[serde(default = "default_true")]
    pub hardware_acceleration: bool,
    #[serde(default)]
    pub large_heap: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            hardware_acceleration: true,
            large_heap: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Icon generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsConfig {
    #[serde(default = "default_asset_source")]
    pub source: PathBuf,
    #[serde(default = "default_asset_output")]
    pub output: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            source: default_asset_source(),
            output: default_asset_output(),
        }
    }
}

fn default_asset_source() -> PathBuf {
    PathBuf::from("assets/logo.svg")
}

/// Default output directory for generated assets
pub fn default_asset_output() -> PathBuf {
    PathBuf::from("assets-gen")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosConfig {
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default = "default_deployment_target")]
    pub deployment_target: String,
}

impl Default for IosConfig {
    fn default() -> Self {
        Self {
            team_id: None,
            deployment_target: default_deployment_target(),
        }
    }
}

fn default_deployment_target() -> String {
    "13.0".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishConfig {
    /// Play Console track
    #[serde(default = "default_track")]
    pub track: String,
    /// GitHub `owner/name` for release uploads
    #[serde(default)]
    pub repo: Option<String>,
}

fn default_track() -> String {
    "internal".to_string()
}
