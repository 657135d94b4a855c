//! External command-line tools the Android steps drive
//!
//! A [`Tool`] is a base argv (program plus fixed leading arguments). Steps
//! build every invocation from a tool, so a [`Toolbox`] can be swapped for
//! stand-ins in tests.

use deploid_core::process::{command_exists, CommandLine};
use std::path::PathBuf;

/// Base command line for one external tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    argv: Vec<String>,
}

impl Tool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
        }
    }

    /// Program followed by fixed leading arguments
    pub fn with_prefix<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Self::new("true");
        }
        Self { argv }
    }

    /// `npx cap`
    pub fn capacitor() -> Self {
        Self::with_prefix(["npx", "cap"])
    }

    /// `adb` from `PATH`, else from the SDK's `platform-tools`
    pub fn adb() -> Self {
        Self::new(locate_adb().to_string_lossy())
    }

    pub fn firebase() -> Self {
        Self::new("firebase")
    }

    pub fn gh() -> Self {
        Self::new("gh")
    }

    pub fn fastlane() -> Self {
        Self::new("fastlane")
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Fresh command line with the base argv
    pub fn command(&self) -> CommandLine {
        CommandLine::new(self.argv[0].clone()).args(self.argv[1..].iter().cloned())
    }
}

/// The tools used by one step
#[derive(Debug, Clone)]
pub struct Toolbox {
    pub capacitor: Tool,
    pub adb: Tool,
    pub firebase: Tool,
    pub gh: Tool,
    pub fastlane: Tool,
}

impl Default for Toolbox {
    fn default() -> Self {
        Self {
            capacitor: Tool::capacitor(),
            adb: Tool::adb(),
            firebase: Tool::firebase(),
            gh: Tool::gh(),
            fastlane: Tool::fastlane(),
        }
    }
}

fn locate_adb() -> PathBuf {
    let exe = if cfg!(windows) { "adb.exe" } else { "adb" };
    if command_exists(exe) {
        return PathBuf::from(exe);
    }
    ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|sdk| PathBuf::from(sdk).join("platform-tools").join(exe))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(exe))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::path::Path;

    /// A tool that appends `<name> <args>` to `log` and succeeds
    pub fn recorder(name: &str, log: &Path) -> Tool {
        Tool::with_prefix([
            "sh".to_string(),
            "-c".to_string(),
            format!("echo \"$0 $*\" >> '{}'", log.display()),
            name.to_string(),
        ])
    }

    /// A tool that prints `stdout` and exits with `code`
    pub fn scripted(name: &str, stdout: &str, code: i32) -> Tool {
        Tool::with_prefix([
            "sh".to_string(),
            "-c".to_string(),
            format!("printf '%s' '{}'; exit {}", stdout.replace('\'', r"'\''"), code),
            name.to_string(),
        ])
    }

    /// Every tool records into `log`
    pub fn recording_toolbox(log: &Path) -> Toolbox {
        Toolbox {
            capacitor: recorder("cap", log),
            adb: recorder("adb", log),
            firebase: recorder("firebase", log),
            gh: recorder("gh", log),
            fastlane: recorder("fastlane", log),
        }
    }

    pub fn calls(log: &Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_kept() {
        let cmd = Tool::capacitor().command().arg("sync").arg("android");
        assert_eq!(cmd.program(), "npx");
        assert_eq!(cmd.get_args(), ["cap", "sync", "android"]);
    }

    #[test]
    fn test_empty_prefix_falls_back() {
        let tool = Tool::with_prefix(Vec::<String>::new());
        assert_eq!(tool.program(), "true");
    }
}
