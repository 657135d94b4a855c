//! Typed, format-preserving file patches
//!
//! A patch rewrites only the spans it owns; whitespace, comments and
//! unrelated content pass through untouched. Applying a patch twice yields
//! the same text as applying it once.

use deploid_core::{Context, Error, Result};
use std::fs;
use std::path::Path;

/// An edit to one file's text
pub trait Patch {
    /// Label used in logs and missing-input warnings
    fn target(&self) -> &'static str;

    /// Return the patched text
    fn apply(&self, content: &str) -> Result<String>;
}

/// What happened to a patched file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Changed,
    Unchanged,
    /// The file does not exist and the missing-input policy allowed skipping
    Skipped,
}

/// Apply `patch` to the file at `path`, writing only when the text changes
pub fn patch_file(ctx: &Context, path: &Path, patch: &dyn Patch) -> Result<PatchOutcome> {
    ctx.logger.file_check(patch.target(), path);
    if !path.is_file() {
        ctx.missing_input(path, patch.target())?;
        return Ok(PatchOutcome::Skipped);
    }

    let before = fs::read_to_string(path)?;
    let after = patch
        .apply(&before)
        .map_err(|e| e.with_context(format!("while patching {}", path.display())))?;

    if after == before {
        ctx.logger.debug(format!("{} already up to date", patch.target()));
        return Ok(PatchOutcome::Unchanged);
    }
    fs::write(path, after)?;
    ctx.logger.debug(format!("patched {}", path.display()));
    Ok(PatchOutcome::Changed)
}

/// Index of the `}` closing the block opened at `open`, which must be `{`
pub(crate) fn block_end(content: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, ch) in content[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Leading whitespace of the line containing byte `index`
pub(crate) fn line_indent(content: &str, index: usize) -> &str {
    let start = content[..index].rfind('\n').map_or(0, |i| i + 1);
    let line = &content[start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Byte offset just past the end of the line containing `index`
pub(crate) fn after_line(content: &str, index: usize) -> usize {
    content[index..]
        .find('\n')
        .map_or(content.len(), |i| index + i + 1)
}

pub(crate) fn malformed(target: &str, what: &str) -> Error {
    Error::validation(format!("{}: {}", target, what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploid_core::config::MissingInputPolicy;
    use deploid_core::testing::demo_context;
    use deploid_core::ErrorCode;
    use tempfile::TempDir;

    struct Upper;

    impl Patch for Upper {
        fn target(&self) -> &'static str {
            "upper.txt"
        }

        fn apply(&self, content: &str) -> Result<String> {
            Ok(content.to_uppercase())
        }
    }

    #[test]
    fn test_block_end_handles_nesting() {
        let text = "android { a { b } c }";
        assert_eq!(block_end(text, 8), Some(text.len() - 1));
        assert_eq!(block_end("{ {", 0), None);
    }

    #[test]
    fn test_line_indent() {
        let text = "a\n    b = 1\n";
        assert_eq!(line_indent(text, 8), "    ");
        assert_eq!(line_indent(text, 0), "");
        assert_eq!(after_line(text, 3), 12);
    }

    #[test]
    fn test_patch_file_outcomes() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = demo_context(dir.path());
        let path = dir.path().join("upper.txt");

        std::fs::write(&path, "abc").unwrap();
        assert_eq!(patch_file(&ctx, &path, &Upper).unwrap(), PatchOutcome::Changed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ABC");
        assert_eq!(patch_file(&ctx, &path, &Upper).unwrap(), PatchOutcome::Unchanged);
    }

    #[test]
    fn test_patch_file_missing_follows_policy() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, buffer) = demo_context(dir.path());
        let path = dir.path().join("absent.txt");

        assert_eq!(patch_file(&ctx, &path, &Upper).unwrap(), PatchOutcome::Skipped);
        assert!(buffer.contents().contains("warn: upper.txt not found"));

        ctx.config.on_missing_input = MissingInputPolicy::Abort;
        let err = patch_file(&ctx, &path, &Upper).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
    }
}
