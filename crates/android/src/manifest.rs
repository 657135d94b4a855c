//! AndroidManifest.xml and styles.xml patches
//!
//! Edits are textual and scoped: permissions are inserted before
//! `</manifest>`, attributes are set inside one opening tag. Nothing else in
//! the document is touched.

use crate::patch::{malformed, Patch};
use deploid_core::config::AndroidConfig;
use deploid_core::Result;
use regex::{NoExpand, Regex};

const MANIFEST: &str = "AndroidManifest.xml";
const STYLES: &str = "styles.xml";

/// Expand `CAMERA` to `android.permission.CAMERA`; dotted names pass through
pub fn qualify_permission(name: &str) -> String {
    let name = name.trim();
    if name.contains('.') {
        name.to_string()
    } else {
        format!("android.permission.{}", name.to_ascii_uppercase())
    }
}

/// Permissions plus attributes for `<application>` and the launcher activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestPatch {
    pub permissions: Vec<String>,
    pub application: Vec<(String, String)>,
    pub activity: Vec<(String, String)>,
}

impl ManifestPatch {
    pub fn from_config(android: &AndroidConfig) -> Self {
        let mut permissions: Vec<String> = Vec::new();
        for permission in android.permissions.iter().map(|p| qualify_permission(p)) {
            if !permissions.contains(&permission) {
                permissions.push(permission);
            }
        }

        let mut application = vec![(
            "android:hardwareAccelerated".to_string(),
            android.performance.hardware_acceleration.to_string(),
        )];
        if android.performance.large_heap {
            application.push(("android:largeHeap".to_string(), "true".to_string()));
        }

        let mut activity = Vec::new();
        if let Some(orientation) = &android.display.orientation {
            activity.push(("android:screenOrientation".to_string(), orientation.clone()));
        }

        Self {
            permissions,
            application,
            activity,
        }
    }
}

impl Patch for ManifestPatch {
    fn target(&self) -> &'static str {
        MANIFEST
    }

    fn apply(&self, content: &str) -> Result<String> {
        let mut out = add_permissions(content, &self.permissions)?;

        if !self.application.is_empty() {
            let (start, end) = open_tag(&out, "application", 0)
                .ok_or_else(|| malformed(MANIFEST, "no <application> element"))?;
            out = set_attributes(&out, start, end, &self.application)?;
        }

        if !self.activity.is_empty() {
            let (start, end) = launcher_activity(&out)
                .ok_or_else(|| malformed(MANIFEST, "no <activity> element"))?;
            out = set_attributes(&out, start, end, &self.activity)?;
        }

        Ok(out)
    }
}

/// Adds `android:windowFullscreen` to the app's no-action-bar theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullscreenPatch;

const FULLSCREEN_ITEM: &str = r#"<item name="android:windowFullscreen">true</item>"#;

impl Patch for FullscreenPatch {
    fn target(&self) -> &'static str {
        STYLES
    }

    fn apply(&self, content: &str) -> Result<String> {
        if content.contains("android:windowFullscreen") {
            let re = Regex::new(r#"(<item\s+name="android:windowFullscreen"\s*>)\s*\w+\s*(</item>)"#)?;
            return Ok(re.replace_all(content, "${1}true${2}").into_owned());
        }

        let start = content
            .find(r#"name="AppTheme.NoActionBar""#)
            .or_else(|| content.find("<style"))
            .ok_or_else(|| malformed(STYLES, "no <style> element"))?;
        let close = content[start..]
            .find("</style>")
            .map(|i| start + i)
            .ok_or_else(|| malformed(STYLES, "unterminated <style> element"))?;

        let line_start = content[..close].rfind('\n').map_or(0, |i| i + 1);
        let closing_indent = &content[line_start..close];
        let mut out = String::with_capacity(content.len() + FULLSCREEN_ITEM.len() + 16);
        if closing_indent.trim().is_empty() {
            out.push_str(&content[..line_start]);
            out.push_str(&format!("{}    {}\n", closing_indent, FULLSCREEN_ITEM));
            out.push_str(&content[line_start..]);
        } else {
            out.push_str(&content[..close]);
            out.push_str(FULLSCREEN_ITEM);
            out.push_str(&content[close..]);
        }
        Ok(out)
    }
}

fn add_permissions(content: &str, permissions: &[String]) -> Result<String> {
    let mut missing = Vec::new();
    for permission in permissions {
        let re = Regex::new(&format!(
            r#"<uses-permission\b[^>]*android:name\s*=\s*"{}""#,
            regex::escape(permission)
        ))?;
        if !re.is_match(content) {
            missing.push(permission);
        }
    }
    if missing.is_empty() {
        return Ok(content.to_string());
    }

    let close = content
        .rfind("</manifest>")
        .ok_or_else(|| malformed(MANIFEST, "no closing </manifest> tag"))?;
    let indent = open_tag(content, "application", 0)
        .map(|(start, _)| crate::patch::line_indent(content, start).to_string())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| "    ".to_string());

    let mut block = String::new();
    for permission in missing {
        block.push_str(&format!(
            "{}<uses-permission android:name=\"{}\" />\n",
            indent, permission
        ));
    }

    let line_start = content[..close].rfind('\n').map_or(0, |i| i + 1);
    let mut out = String::with_capacity(content.len() + block.len() + 1);
    if content[line_start..close].trim().is_empty() {
        out.push_str(&content[..line_start]);
        out.push_str(&block);
        out.push_str(&content[line_start..]);
    } else {
        out.push_str(&content[..close]);
        out.push('\n');
        out.push_str(&block);
        out.push_str(&content[close..]);
    }
    Ok(out)
}

/// Byte range `(start, end)` of the opening tag `<name ...>`, `end` at `>`
fn open_tag(content: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let needle = format!("<{}", name);
    let mut search = from;
    while let Some(offset) = content[search..].find(&needle) {
        let start = search + offset;
        let after = content[start + needle.len()..].chars().next()?;
        if after.is_whitespace() || after == '>' || after == '/' {
            let end = start + content[start..].find('>')?;
            return Some((start, end));
        }
        search = start + needle.len();
    }
    None
}

/// Opening tag of the activity handling `android.intent.action.MAIN`,
/// falling back to the first activity
fn launcher_activity(content: &str) -> Option<(usize, usize)> {
    let first = open_tag(content, "activity", 0)?;
    let mut cursor = first;
    loop {
        let (start, end) = cursor;
        let body_end = if content[..=end].ends_with("/>") {
            end
        } else {
            content[end..].find("</activity>").map_or(content.len(), |i| end + i)
        };
        if content[start..body_end].contains("android.intent.action.MAIN") {
            return Some(cursor);
        }
        match open_tag(content, "activity", body_end) {
            Some(next) => cursor = next,
            None => return Some(first),
        }
    }
}

fn set_attributes(
    content: &str,
    start: usize,
    end: usize,
    attributes: &[(String, String)],
) -> Result<String> {
    let mut tag = content[start..=end].to_string();
    for (name, value) in attributes {
        let re = Regex::new(&format!(r#"{}\s*=\s*"[^"]*""#, regex::escape(name)))?;
        let rendered = format!("{}=\"{}\"", name, escape_attr(value));
        if re.is_match(&tag) {
            tag = re.replace(&tag, NoExpand(&rendered)).into_owned();
            continue;
        }

        let close_at = if tag.ends_with("/>") { tag.len() - 2 } else { tag.len() - 1 };
        let insert_at = tag[..close_at].trim_end().len();
        let separator = if tag.contains('\n') {
            let indent = tag
                .lines()
                .nth(1)
                .map(|line| &line[..line.len() - line.trim_start().len()])
                .unwrap_or("    ");
            format!("\n{}", indent)
        } else {
            " ".to_string()
        };
        tag.insert_str(insert_at, &format!("{}{}", separator, rendered));
    }

    Ok(format!("{}{}{}", &content[..start], tag, &content[end + 1..]))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploid_core::testing::{config_from, demo_config_json};

    const CAPACITOR_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android">

    <application
        android:allowBackup="true"
        android:icon="@mipmap/ic_launcher"
        android:theme="@style/AppTheme">

        <activity
            android:name=".MainActivity"
            android:exported="true">

            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>

        </activity>
    </application>

    <!-- Permissions -->

    <uses-permission android:name="android.permission.INTERNET" />
</manifest>
"#;

    fn android_config(extra: serde_json::Value) -> AndroidConfig {
        let mut json = demo_config_json();
        for (key, value) in extra.as_object().unwrap() {
            json["android"][key] = value.clone();
        }
        config_from(json).android
    }

    #[test]
    fn test_qualify_permission() {
        assert_eq!(qualify_permission("camera"), "android.permission.CAMERA");
        assert_eq!(
            qualify_permission("com.google.android.c2dm.permission.RECEIVE"),
            "com.google.android.c2dm.permission.RECEIVE"
        );
    }

    #[test]
    fn test_permissions_added_once_with_indent() {
        let patch = ManifestPatch {
            permissions: vec![
                "android.permission.INTERNET".to_string(),
                "android.permission.CAMERA".to_string(),
            ],
            ..Default::default()
        };

        let once = patch.apply(CAPACITOR_MANIFEST).unwrap();
        assert_eq!(once.matches("android.permission.INTERNET").count(), 1);
        assert!(once.contains(
            "    <uses-permission android:name=\"android.permission.CAMERA\" />\n</manifest>"
        ));
        assert!(once.contains("    <!-- Permissions -->"));
        assert_eq!(patch.apply(&once).unwrap(), once);
    }

    #[test]
    fn test_application_attributes_set_and_replaced() {
        let android = android_config(serde_json::json!({
            "performance": { "hardwareAcceleration": false, "largeHeap": true }
        }));
        let patch = ManifestPatch::from_config(&android);
        let out = patch.apply(CAPACITOR_MANIFEST).unwrap();

        assert!(out.contains(
            "        android:theme=\"@style/AppTheme\"\n        android:hardwareAccelerated=\"false\"\n        android:largeHeap=\"true\">"
        ));

        let flipped = ManifestPatch {
            application: vec![("android:hardwareAccelerated".to_string(), "true".to_string())],
            ..Default::default()
        };
        let again = flipped.apply(&out).unwrap();
        assert_eq!(again.matches("android:hardwareAccelerated").count(), 1);
        assert!(again.contains("android:hardwareAccelerated=\"true\""));
    }

    #[test]
    fn test_orientation_goes_on_launcher_activity() {
        let manifest = CAPACITOR_MANIFEST.replace(
            "        <activity\n",
            "        <activity android:name=\".Other\" />\n        <activity\n",
        );
        let android = android_config(serde_json::json!({ "display": { "orientation": "portrait" } }));
        let out = ManifestPatch::from_config(&android).apply(&manifest).unwrap();

        assert!(out.contains("<activity android:name=\".Other\" />"));
        assert!(out.contains(
            "            android:exported=\"true\"\n            android:screenOrientation=\"portrait\">"
        ));
    }

    #[test]
    fn test_single_line_tag() {
        let manifest = "<manifest>\n  <application android:label=\"x\"/>\n</manifest>\n";
        let patch = ManifestPatch {
            application: vec![("android:largeHeap".to_string(), "true".to_string())],
            ..Default::default()
        };
        let out = patch.apply(manifest).unwrap();
        assert!(out.contains("<application android:label=\"x\" android:largeHeap=\"true\"/>"));
    }

    #[test]
    fn test_missing_application_is_error() {
        let patch = ManifestPatch {
            application: vec![("android:largeHeap".to_string(), "true".to_string())],
            ..Default::default()
        };
        assert!(patch.apply("<manifest>\n</manifest>\n").is_err());
    }

    #[test]
    fn test_fullscreen_patch() {
        let styles = r#"<resources>
    <style name="AppTheme.NoActionBar" parent="Theme.AppCompat.DayNight.NoActionBar">
        <item name="windowActionBar">false</item>
    </style>
</resources>
"#;
        let out = FullscreenPatch.apply(styles).unwrap();
        assert!(out.contains(
            "        <item name=\"windowActionBar\">false</item>\n        <item name=\"android:windowFullscreen\">true</item>\n    </style>"
        ));
        assert_eq!(FullscreenPatch.apply(&out).unwrap(), out);
    }
}
