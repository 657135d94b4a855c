//! End-to-end checks of the `deploid` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
appName = "Demo"
appId = "com.x.demo"

[web]
framework = "vite"
buildCommand = "true"

[android]
packaging = "capacitor"
"#;

fn deploid(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("deploid").unwrap();
    cmd.current_dir(cwd)
        .env_remove("DEPLOID_LOG_LEVEL")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

fn project(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("deploid.config.toml"), config).unwrap();
    dir
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    deploid(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("package"))
        .stdout(predicate::str::contains("uninstall"))
        .stdout(predicate::str::contains("--cwd"));
}

#[test]
fn version_flag() {
    let dir = TempDir::new().unwrap();
    deploid(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("deploid "));
}

#[test]
fn init_writes_config_once() {
    let dir = TempDir::new().unwrap();
    deploid(dir.path())
        .args(["init", "--framework", "react", "--name", "Shop"])
        .assert()
        .success();
    let written = fs::read_to_string(dir.path().join("deploid.config.toml")).unwrap();
    assert!(written.contains("appId = \"com.example.shop\""));
    assert!(written.contains("webDir = \"build\""));

    deploid(dir.path())
        .arg("init")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--force"));

    deploid(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn missing_config_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    deploid(dir.path())
        .arg("package")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E3001"))
        .stderr(predicate::str::contains("deploid init"));
}

#[test]
fn unknown_step_names_the_step() {
    let dir = project(CONFIG);
    deploid(dir.path())
        .args(["run", "teleport"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Step not found: teleport"));
}

#[test]
fn unsupported_engine_is_a_warning() {
    let dir = project(&CONFIG.replace("\"capacitor\"", "\"tauri\""));
    deploid(dir.path())
        .arg("package")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Packaging engine 'tauri' is not supported yet",
        ));
    assert!(!dir.path().join("android").exists());
}

#[test]
fn assets_without_logo_warns_and_succeeds() {
    let dir = project(CONFIG);
    deploid(dir.path())
        .arg("assets")
        .assert()
        .success()
        .stderr(predicate::str::contains("Icon source not found"));
}

#[test]
fn assets_without_logo_aborts_when_configured() {
    let config = CONFIG.replace(
        "appId = \"com.x.demo\"",
        "appId = \"com.x.demo\"\nonMissingInput = \"abort\"",
    );
    let dir = project(&config);
    deploid(dir.path())
        .arg("assets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[cfg(unix)]
#[test]
fn project_local_step_runs_as_command() {
    let dir = project(CONFIG);
    let package = dir.path().join("node_modules/@deploid/hello");
    fs::create_dir_all(&package).unwrap();
    fs::write(
        package.join("package.json"),
        r#"{"name": "@deploid/hello", "version": "0.1.0",
            "deploid": {"command": ["sh", "-c", "echo \"hello from $DEPLOID_STEP\""]}}"#,
    )
    .unwrap();

    deploid(dir.path())
        .args(["run", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from hello"));

    deploid(dir.path())
        .args(["plugin", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn plugin_list_on_empty_project() {
    let dir = TempDir::new().unwrap();
    deploid(dir.path())
        .args(["plugin", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No step packages"));
}

#[test]
fn ios_handoff_writes_notes() {
    let dir = project(CONFIG);
    deploid(dir.path())
        .args(["ios", "handoff"])
        .assert()
        .success();
    let notes = fs::read_to_string(dir.path().join("ios/DEPLOID_IOS.md")).unwrap();
    assert!(notes.contains("com.x.demo"));
}

#[test]
fn cwd_flag_selects_project() {
    let dir = project(CONFIG);
    let elsewhere = TempDir::new().unwrap();
    deploid(elsewhere.path())
        .args(["--cwd", dir.path().to_str().unwrap(), "ios", "handoff"])
        .assert()
        .success();
    assert!(dir.path().join("ios/DEPLOID_IOS.md").is_file());
}
