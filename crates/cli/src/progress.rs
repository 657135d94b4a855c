//! Progress bars for steps that produce many files
//!
//! Bars draw to stderr; indicatif keeps them hidden when stderr is not a
//! terminal, so captured output stays clean.

pub use indicatif::ProgressBar;
use indicatif::ProgressStyle;

const TEMPLATE: &str = "{msg:>8} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg:.dim}";

/// Bar counting `total` items
pub fn progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(message.to_string());
    pb
}

/// Complete the bar with a closing note
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("done, {}", message));
}

/// Leave the bar where it stopped
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("failed, {}", message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_counts() {
        let pb = progress_bar(16, "Icons");
        pb.inc(5);
        assert_eq!(pb.position(), 5);
        assert_eq!(pb.length(), Some(16));
        finish_error(&pb, "stopped");
        assert!(pb.is_finished());
    }

    #[test]
    fn test_finish_success() {
        let pb = progress_bar(2, "Icons");
        pb.inc(2);
        finish_success(&pb, "icons rendered");
        assert!(pb.is_finished());
    }
}
