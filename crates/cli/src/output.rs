//! Terminal output the binary prints itself, outside of a step's logger
//!
//! Colors follow `owo_colors` stream detection, so `--no-color` and
//! redirected output both produce plain text.

use deploid_core::Error;
use owo_colors::{OwoColorize, Stream};
use std::fmt::Write;

/// One-line status messages
pub struct Status;

impl Status {
    /// Stdout, prefixed with a green check
    pub fn success(message: &str) {
        println!("{} {}", "✓".if_supports_color(Stream::Stdout, |s| s.green()), message);
    }

    /// Stderr, prefixed with a yellow sign
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |s| s.yellow()), message);
    }

    /// Stdout, prefixed with a blue sign
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".if_supports_color(Stream::Stdout, |s| s.blue()), message);
    }

    /// Bold title over a rule of the same width
    pub fn header(message: &str) {
        println!("{}", message.if_supports_color(Stream::Stdout, |s| s.bold()));
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// `key  value` with the key padded to `width`
    pub fn row(key: &str, value: &str, width: usize) {
        let padded = format!("{:<width$}", key, width = width);
        println!("  {}  {}", padded.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
    }

    /// Print a fatal error to stderr
    pub fn report(err: &Error) {
        eprintln!("{}", render_error(err));
    }
}

/// Error line with code and category, then indented context and hint
///
/// ```text
/// ✗ [E4000] Step not found: teleport (Resolution)
///   no package at ... and no bundled step with that name
///   hint: Install it with `deploid plugin add teleport` or check the step name
/// ```
pub fn render_error(err: &Error) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{} {} {} {}",
        "✗".if_supports_color(Stream::Stderr, |s| s.red()),
        format!("[{}]", err.code).if_supports_color(Stream::Stderr, |s| s.bold()),
        err.message,
        format!("({})", err.code.category()).if_supports_color(Stream::Stderr, |s| s.dimmed()),
    );
    for line in err.context.iter().flat_map(|c| c.lines()) {
        let _ = write!(out, "\n  {}", line);
    }
    if let Some(suggestion) = &err.suggestion {
        let _ = write!(
            out,
            "\n  {} {}",
            "hint:".if_supports_color(Stream::Stderr, |s| s.cyan()),
            suggestion
        );
    }
    out
}

/// `850ms`, `4.2s` or `3m 07s`
pub fn format_duration(duration: std::time::Duration) -> String {
    let millis = duration.as_millis();
    match millis {
        0..=999 => format!("{}ms", millis),
        1_000..=59_999 => format!("{:.1}s", duration.as_secs_f64()),
        _ => {
            let secs = duration.as_secs();
            format!("{}m {:02}s", secs / 60, secs % 60)
        }
    }
}

/// Binary-prefixed size with two decimals above one KiB
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// `1 icon`, `16 icons`
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    let noun = if count == 1 { singular } else { plural };
    format!("{} {}", count, noun)
}
