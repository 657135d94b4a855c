//! deploid CLI
//!
//! Turns a web app into an Android package and an iOS project skeleton by
//! driving Capacitor, Gradle, adb and friends.

use clap::{Parser, Subcommand};
use deploid_cli::Status;
use deploid_core::{Flags, LogLevel, Logger};
use deploid_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod registry;

use commands::plugin::PluginAction;
use commands::steps::Selection;

/// Web app to Android package (and iOS skeleton)
#[derive(Parser)]
#[command(name = "deploid")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Debug-level output and tracing diagnostics
    #[arg(long, global = true)]
    debug: bool,

    /// Project directory
    #[arg(long, global = true, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a deploid.config.toml for this project
    Init {
        /// Web framework preset (vite, react, next, nuxt, sveltekit, angular, static)
        #[arg(long, default_value = "vite")]
        framework: String,
        /// Packaging engine
        #[arg(long, default_value = "capacitor")]
        engine: String,
        /// Application name, defaults to package.json `name` or the directory name
        #[arg(long)]
        name: Option<String>,
        /// Application id, defaults to com.example.<name>
        #[arg(long)]
        app_id: Option<String>,
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Generate launcher, PWA and favicon icons
    Assets,

    /// Generate or refresh the native Android project
    Package,

    /// Build the web app and the Android package
    Build {
        /// Release variant
        #[arg(long)]
        release: bool,
        /// App bundle (AAB) instead of an APK
        #[arg(long)]
        bundle: bool,
    },

    /// Enable WebView remote debugging
    Debug,

    /// Install and launch the latest APK on a device
    Deploy {
        /// adb serial of the target device
        #[arg(long)]
        device: Option<String>,
        /// Install the release APK
        #[arg(long)]
        release: bool,
    },

    /// List attached devices
    Devices,

    /// Stream the app's logcat output
    Logs {
        #[arg(long)]
        device: Option<String>,
    },

    /// Remove the app from a device
    Uninstall {
        #[arg(long)]
        device: Option<String>,
    },

    /// Prepare the iOS project (all parts when no part is given)
    Ios {
        #[command(subcommand)]
        part: Option<IosPart>,
    },

    /// Register the app with Firebase and add google-services
    Firebase,

    /// Manage project-local step packages
    Plugin {
        #[command(subcommand)]
        action: PluginAction,
    },

    /// Publish the release artifact to GitHub and/or Google Play
    Publish {
        /// Publish the app bundle
        #[arg(long)]
        bundle: bool,
    },

    /// Run steps by name, in order (the configured steps when none are given)
    Run {
        steps: Vec<String>,
        #[arg(long)]
        release: bool,
        #[arg(long)]
        bundle: bool,
        #[arg(long)]
        device: Option<String>,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum IosPart {
    /// Add the Capacitor iOS platform
    Init,
    /// Write the AppIcon set
    Assets,
    /// Write the Xcode hand-off notes
    Handoff,
}

impl IosPart {
    fn step(self) -> &'static str {
        match self {
            IosPart::Init => "ios-init",
            IosPart::Assets => "ios-assets",
            IosPart::Handoff => "ios-handoff",
        }
    }
}

/// Flag overrides only apply when given; otherwise config decides
fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

fn steps(names: &[&str], flags: Flags) -> (Selection, Flags) {
    (
        Selection::Named(names.iter().map(|s| s.to_string()).collect()),
        flags,
    )
}

fn init_telemetry(debug: bool) -> anyhow::Result<()> {
    let config = if debug {
        TelemetryConfig::debug()
    } else {
        TelemetryConfig::default()
    };
    deploid_telemetry::init_with_config(config)
}

async fn run(cli: Cli) -> deploid_core::Result<()> {
    let cwd = match cli.cwd {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => std::env::current_dir()?.join(dir),
        None => std::env::current_dir()?,
    };
    if !cwd.is_dir() {
        return Err(deploid_core::Error::directory_not_found(&cwd)
            .with_suggestion("Pass an existing project directory with --cwd"));
    }

    let logger = if cli.debug {
        Logger::from_env().with_level(LogLevel::Debug)
    } else {
        Logger::from_env()
    };

    let (selection, flags) = match cli.command {
        Commands::Init {
            framework,
            engine,
            name,
            app_id,
            force,
        } => {
            let options = commands::init::InitOptions {
                framework,
                engine,
                name,
                app_id,
                force,
            };
            return commands::init::run(&cwd, &options, &logger);
        }
        Commands::Plugin { action } => return commands::plugin::run(&cwd, action, &logger).await,

        Commands::Assets => steps(&["assets"], Flags::default()),
        Commands::Package => (Selection::Configured, Flags::default()),
        Commands::Build { release, bundle } => steps(
            &["build"],
            Flags {
                release: flag(release),
                bundle: flag(bundle),
                device: None,
            },
        ),
        Commands::Debug => steps(&["debug"], Flags::default()),
        Commands::Deploy { device, release } => steps(
            &["deploy"],
            Flags {
                release: flag(release),
                bundle: None,
                device,
            },
        ),
        Commands::Devices => steps(&["devices"], Flags::default()),
        Commands::Logs { device } => steps(
            &["logs"],
            Flags {
                device,
                ..Flags::default()
            },
        ),
        Commands::Uninstall { device } => steps(
            &["uninstall"],
            Flags {
                device,
                ..Flags::default()
            },
        ),
        Commands::Ios { part } => steps(&[part.map_or("ios", IosPart::step)], Flags::default()),
        Commands::Firebase => steps(&["firebase"], Flags::default()),
        Commands::Publish { bundle } => steps(
            &["publish"],
            Flags {
                bundle: flag(bundle),
                ..Flags::default()
            },
        ),
        Commands::Run {
            steps,
            release,
            bundle,
            device,
        } => {
            let flags = Flags {
                release: flag(release),
                bundle: flag(bundle),
                device,
            };
            if steps.is_empty() {
                (Selection::Configured, flags)
            } else {
                (Selection::Named(steps), flags)
            }
        }
    };

    commands::steps::run(&cwd, selection, flags, cli.debug, logger).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    if let Err(e) = init_telemetry(cli.debug) {
        Status::warning(&format!("{:#}", e));
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            Status::report(&err);
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}
