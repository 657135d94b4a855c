//! Terminal helpers shared by the deploid binary and its steps

#![warn(missing_docs)]

pub mod output;
pub mod progress;

pub use output::{format_count, format_duration, format_size, render_error, Status};
