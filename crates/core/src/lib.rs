//! Core of the deploid toolchain
//!
//! Everything a step needs to run lives here:
//!
//! - **Configuration**: discovery and parsing of `deploid.config.*` files
//! - **Logging**: the leveled [`Logger`] carried by every [`Context`]
//! - **Steps**: the [`Step`] contract and the [`StepId`] registry of bundled steps
//! - **Resolution**: the [`PluginLoader`], project-local packages first
//! - **Pipelines**: sequential, fail-fast, cancellable execution
//! - **Processes**: async subprocess helpers built on tokio
//!
//! # Example
//!
//! ```rust,no_run
//! use deploid_core::prelude::*;
//!
//! # async fn demo(bundled: impl BundledSteps + 'static) -> Result<()> {
//! let cwd = std::env::current_dir()?;
//! let loaded = config::load(&cwd)?;
//! let ctx = Context::new(cwd, loaded.config, Logger::from_env());
//!
//! let pipeline = PluginLoader::new(bundled).load_from_config(&ctx)?;
//! pipeline.run(&ctx).await
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod loader;
pub mod logger;
pub mod pipeline;
pub mod process;
pub mod step;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use cancel::CancelToken;
pub use context::{Context, Flags};
pub use error::{Error, ErrorCode, Result, ResultExt};
pub use loader::{BundledSteps, PluginLoader};
pub use logger::{LogLevel, Logger};
pub use pipeline::Pipeline;
pub use step::{BoxedStep, Step, StepId, StepOrigin};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::config::{self, Config, MissingInputPolicy};
    pub use crate::context::{Context, Flags};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::loader::{BundledSteps, PluginLoader};
    pub use crate::logger::{LogLevel, Logger};
    pub use crate::pipeline::Pipeline;
    pub use crate::process::{CommandLine, CommandResult};
    pub use crate::step::{BoxedStep, Step, StepId, StepOrigin};
    pub use async_trait::async_trait;
}
