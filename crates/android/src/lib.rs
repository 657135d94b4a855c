//! Android steps for deploid
//!
//! This crate provides the steps that turn a built web app into an Android
//! package and move it onto devices and stores:
//! - Capacitor packaging and format-preserving native patches
//! - Gradle builds with environment-supplied signing passwords
//! - adb device selection, install, logs and uninstall
//! - Firebase registration and GitHub / Play publishing
//!
//! Every external program is reached through a [`Toolbox`], so steps can be
//! pointed at stand-ins.

pub mod adb;
pub mod build;
pub mod capacitor;
pub mod debug;
pub mod device;
pub mod firebase;
pub mod gradle;
pub mod manifest;
pub mod packager;
pub mod patch;
pub mod project;
pub mod publish;
pub mod tools;

pub use build::{BuildStep, SigningPasswords};
pub use debug::DebugStep;
pub use device::{DeployStep, DevicesStep, LogsStep, UninstallStep};
pub use firebase::FirebaseStep;
pub use packager::{CapacitorPackager, UnsupportedEngineStep};
pub use project::AndroidProject;
pub use publish::PublishStep;
pub use tools::{Tool, Toolbox};
