//! Gradle build system integration
//!
//! Task selection, wrapper invocation, artifact lookup, and the patches
//! applied to `variables.gradle`, `app/build.gradle` and the root
//! `build.gradle`.

use crate::patch::{after_line, block_end, line_indent, malformed, Patch};
use deploid_core::config::{AndroidConfig, SigningConfig};
use deploid_core::process::CommandLine;
use deploid_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Environment variable holding the keystore password
pub const KEYSTORE_PASSWORD_ENV: &str = "DEPLOID_KEYSTORE_PASSWORD";
/// Environment variable holding the key password
pub const KEY_PASSWORD_ENV: &str = "DEPLOID_KEY_PASSWORD";

static VERSION_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\s*versionCode\s+)\d+").expect("valid regex"));
static VERSION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^(\s*versionName\s+)"[^"]*""#).expect("valid regex"));
static STORE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"storeFile\s+file\(\s*"[^"]*"\s*\)"#).expect("valid regex"));
static KEY_ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"keyAlias\s+"[^"]*""#).expect("valid regex"));
static STORE_PASSWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"storePassword[ \t]+[^\n]*").expect("valid regex"));
static KEY_PASSWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"keyPassword[ \t]+[^\n]*").expect("valid regex"));

const GOOGLE_SERVICES_CLASSPATH: &str = "com.google.gms:google-services:4.4.2";
const GOOGLE_SERVICES_PLUGIN: &str = "com.google.gms.google-services";

/// The packaging task to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradleTask {
    AssembleDebug,
    AssembleRelease,
    /// App bundles are always release builds
    BundleRelease,
}

impl GradleTask {
    pub fn select(release: bool, bundle: bool) -> Self {
        match (release, bundle) {
            (_, true) => GradleTask::BundleRelease,
            (true, false) => GradleTask::AssembleRelease,
            (false, false) => GradleTask::AssembleDebug,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GradleTask::AssembleDebug => "assembleDebug",
            GradleTask::AssembleRelease => "assembleRelease",
            GradleTask::BundleRelease => "bundleRelease",
        }
    }

    pub fn is_release(&self) -> bool {
        !matches!(self, GradleTask::AssembleDebug)
    }

    /// Where the task leaves its output, relative to `android/`
    pub fn output_glob(&self) -> &'static str {
        match self {
            GradleTask::AssembleDebug => "app/build/outputs/apk/debug/*.apk",
            GradleTask::AssembleRelease => "app/build/outputs/apk/release/*.apk",
            GradleTask::BundleRelease => "app/build/outputs/bundle/release/*.aab",
        }
    }
}

/// Wrapper invocation for `task` inside `android_dir`
///
/// On Unix the wrapper runs through `sh`, so a checkout that lost the
/// executable bit still builds.
pub fn task_command(android_dir: &Path, task: GradleTask) -> CommandLine {
    let command = if cfg!(windows) {
        CommandLine::new(android_dir.join("gradlew.bat").to_string_lossy())
    } else {
        CommandLine::new("sh").arg(android_dir.join("gradlew").to_string_lossy())
    };
    command.arg(task.name()).current_dir(android_dir)
}

/// Newest artifact produced by `task`
pub fn find_artifact(android_dir: &Path, task: GradleTask) -> Result<PathBuf> {
    let pattern = android_dir.join(task.output_glob());
    let pattern = pattern.to_string_lossy();
    let paths = glob::glob(&pattern)
        .map_err(|e| Error::validation(format!("Bad artifact pattern {}: {}", pattern, e)))?;

    let newest = paths
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .max_by_key(|path| {
            path.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        });
    tracing::debug!(pattern = %pattern, found = ?newest, "artifact lookup");

    newest.ok_or_else(|| {
        Error::file_not_found(android_dir.join(task.output_glob()))
            .with_context(format!("no output from `{}`", task.name()))
            .with_suggestion("Run `deploid build` first")
    })
}

/// SDK levels in `variables.gradle`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkVersionsPatch {
    pub min_sdk: u32,
    pub compile_sdk: u32,
    pub target_sdk: u32,
}

impl SdkVersionsPatch {
    pub fn from_config(android: &AndroidConfig) -> Self {
        Self {
            min_sdk: android.min_sdk,
            compile_sdk: android.compile_sdk(),
            target_sdk: android.target_sdk,
        }
    }
}

impl Patch for SdkVersionsPatch {
    fn target(&self) -> &'static str {
        "variables.gradle"
    }

    fn apply(&self, content: &str) -> Result<String> {
        let mut out = content.to_string();
        for (key, value) in [
            ("minSdkVersion", self.min_sdk),
            ("compileSdkVersion", self.compile_sdk),
            ("targetSdkVersion", self.target_sdk),
        ] {
            let re = Regex::new(&format!(r"(?m)^(\s*{}\s*=\s*)\d+", key))?;
            if re.is_match(&out) {
                out = re
                    .replace(&out, |caps: &Captures| format!("{}{}", &caps[1], value))
                    .into_owned();
            } else {
                out = insert_into_block(&out, "ext", &format!("{} = {}", key, value))
                    .ok_or_else(|| malformed(self.target(), "no `ext { }` block"))?;
            }
        }
        Ok(out)
    }
}

/// Version and signing settings in `app/build.gradle`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppGradlePatch {
    pub version_code: Option<u32>,
    pub version_name: Option<String>,
    pub signing: Option<SigningPatch>,
}

/// Release signing config; passwords are read from the environment at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningPatch {
    /// Keystore path as written into Gradle
    pub store_file: String,
    pub alias: String,
}

impl SigningPatch {
    /// Expand `~` and `$VAR` in the keystore path
    pub fn from_config(signing: &SigningConfig, project_root: &Path) -> Result<Self> {
        let expanded = shellexpand::full(&signing.keystore)
            .map_err(|e| Error::config(format!("Cannot expand keystore path: {}", e)))?;
        let path = PathBuf::from(expanded.as_ref());
        let path = if path.is_absolute() {
            path
        } else {
            project_root.join(path)
        };
        Ok(Self {
            store_file: path.to_string_lossy().replace('\\', "/"),
            alias: signing.alias.clone(),
        })
    }
}

impl AppGradlePatch {
    pub fn from_config(android: &AndroidConfig, project_root: &Path) -> Result<Self> {
        let signing = android
            .signing
            .as_ref()
            .map(|s| SigningPatch::from_config(s, project_root))
            .transpose()?;
        Ok(Self {
            version_code: android.version_code,
            version_name: android.version_name.clone(),
            signing,
        })
    }
}

impl Patch for AppGradlePatch {
    fn target(&self) -> &'static str {
        "app/build.gradle"
    }

    fn apply(&self, content: &str) -> Result<String> {
        let mut out = content.to_string();

        if let Some(code) = self.version_code {
            out = set_default_config(&out, &VERSION_CODE, &format!("versionCode {}", code))
                .ok_or_else(|| malformed(self.target(), "no `defaultConfig { }` block"))?;
        }
        if let Some(name) = &self.version_name {
            out = set_default_config(&out, &VERSION_NAME, &format!("versionName \"{}\"", name))
                .ok_or_else(|| malformed(self.target(), "no `defaultConfig { }` block"))?;
        }
        if let Some(signing) = &self.signing {
            out = apply_signing(&out, signing, self.target())?;
        }
        Ok(out)
    }
}

/// Replace the `re` line in place, or add `line` to `defaultConfig`
fn set_default_config(content: &str, re: &Regex, line: &str) -> Option<String> {
    if re.is_match(content) {
        let value = line.split_once(' ').map_or(line, |(_, v)| v);
        return Some(
            re.replace(content, |caps: &Captures| format!("{}{}", &caps[1], value))
                .into_owned(),
        );
    }
    let (open, _) = named_block(content, "defaultConfig", 0..content.len())?;
    Some(insert_at(content, open, line))
}

fn apply_signing(content: &str, signing: &SigningPatch, target: &str) -> Result<String> {
    let mut out = content.to_string();

    match named_block(&out, "signingConfigs", 0..out.len()) {
        Some((configs_open, configs_close)) => {
            match named_block(&out, "release", configs_open..configs_close) {
                Some((open, _)) => out = update_release_signing(&out, open, signing),
                None => {
                    let block = format!("release {{\n{}}}", indented(&signing_lines(signing)));
                    out = insert_at(&out, configs_open, &block);
                }
            }
        }
        None => {
            let block = format!(
                "signingConfigs {{\n    release {{\n{}    }}\n}}",
                indented(&indented(&signing_lines(signing)))
            );
            out = insert_into_block(&out, "android", &block)
                .ok_or_else(|| malformed(target, "no `android { }` block"))?;
        }
    }

    let (types_open, types_close) = named_block(&out, "buildTypes", 0..out.len())
        .ok_or_else(|| malformed(target, "no `buildTypes { }` block"))?;
    let (open, close) = named_block(&out, "release", types_open..types_close)
        .ok_or_else(|| malformed(target, "no `release { }` build type"))?;
    if !out[open..close].contains("signingConfig signingConfigs.release") {
        out = insert_at(&out, open, "signingConfig signingConfigs.release");
    }
    Ok(out)
}

/// Point an existing `signingConfigs.release` block at the configured keystore
fn update_release_signing(content: &str, open: usize, signing: &SigningPatch) -> String {
    let store = format!("storeFile file(\"{}\")", signing.store_file);
    let alias = format!("keyAlias \"{}\"", signing.alias);
    let store_password = format!("storePassword System.getenv(\"{}\")", KEYSTORE_PASSWORD_ENV);
    let key_password = format!("keyPassword System.getenv(\"{}\")", KEY_PASSWORD_ENV);

    let mut out = content.to_string();
    for (re, line) in [
        (&*STORE_FILE, store),
        (&*KEY_ALIAS, alias),
        (&*STORE_PASSWORD, store_password),
        (&*KEY_PASSWORD, key_password),
    ] {
        let Some(close) = block_end(&out, open) else {
            return out;
        };
        let body = &out[open..close];
        out = match re.find(body) {
            Some(found) => {
                let mut next = out.clone();
                next.replace_range(open + found.start()..open + found.end(), &line);
                next
            }
            None => insert_at(&out, open, &line),
        };
    }
    out
}

fn signing_lines(signing: &SigningPatch) -> String {
    format!(
        "storeFile file(\"{}\")\n\
         storePassword System.getenv(\"{}\")\n\
         keyAlias \"{}\"\n\
         keyPassword System.getenv(\"{}\")\n",
        signing.store_file, KEYSTORE_PASSWORD_ENV, signing.alias, KEY_PASSWORD_ENV
    )
}

fn indented(text: &str) -> String {
    text.lines().map(|line| format!("    {}\n", line)).collect()
}

/// `name { }` block whose opening brace lies in `within`, as (open, close)
fn named_block(content: &str, name: &str, within: Range<usize>) -> Option<(usize, usize)> {
    let re = Regex::new(&format!(r"\b{}\s*\{{", regex::escape(name))).ok()?;
    let found = re.find(&content[within.clone()])?;
    let open = within.start + found.end() - 1;
    let close = block_end(content, open)?;
    (close <= within.end).then_some((open, close))
}

/// Insert `text` (possibly multi-line) as the first entry of the top-level
/// `name { }` block, indented one level deeper than the block
fn insert_into_block(content: &str, name: &str, text: &str) -> Option<String> {
    let re = Regex::new(&format!(r"(?m)^\s*{}\s*\{{", regex::escape(name))).ok()?;
    let found = re.find(content)?;
    Some(insert_at(content, found.end() - 1, text))
}

/// Insert `text` as the first entry of the block opened at `open`
///
/// Goes on its own lines after the `{`, even when the block body shares
/// that line.
fn insert_at(content: &str, open: usize, text: &str) -> String {
    let indent = format!("{}    ", line_indent(content, open));
    let body: String = text
        .lines()
        .map(|line| format!("{}{}\n", indent, line))
        .collect();

    let line_end = after_line(content, open);
    let mut out = content.to_string();
    if content[open + 1..line_end].trim().is_empty() {
        out.insert_str(line_end, &body);
    } else {
        out.insert_str(open + 1, &format!("\n{}", body));
    }
    out
}

/// Google services classpath in the root `build.gradle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoogleServicesClasspath;

impl Patch for GoogleServicesClasspath {
    fn target(&self) -> &'static str {
        "build.gradle"
    }

    fn apply(&self, content: &str) -> Result<String> {
        if content.contains("com.google.gms:google-services") {
            return Ok(content.to_string());
        }
        let buildscript = content
            .find("buildscript")
            .ok_or_else(|| malformed(self.target(), "no `buildscript { }` block"))?;
        let deps = content[buildscript..]
            .find("dependencies")
            .map(|i| buildscript + i)
            .ok_or_else(|| malformed(self.target(), "no buildscript dependencies"))?;
        let open = content[deps..]
            .find('{')
            .map(|i| deps + i)
            .ok_or_else(|| malformed(self.target(), "no buildscript dependencies"))?;

        let indent = format!("{}    ", line_indent(content, deps));
        let mut out = content.to_string();
        out.insert_str(
            after_line(content, open),
            &format!("{}classpath '{}'\n", indent, GOOGLE_SERVICES_CLASSPATH),
        );
        Ok(out)
    }
}

/// Google services plugin applied in `app/build.gradle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoogleServicesPlugin;

impl Patch for GoogleServicesPlugin {
    fn target(&self) -> &'static str {
        "app/build.gradle"
    }

    fn apply(&self, content: &str) -> Result<String> {
        if content.contains(GOOGLE_SERVICES_PLUGIN) {
            return Ok(content.to_string());
        }
        let mut out = content.to_string();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("\napply plugin: '{}'\n", GOOGLE_SERVICES_PLUGIN));
        Ok(out)
    }
}
