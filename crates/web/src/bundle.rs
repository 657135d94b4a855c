//! Bundle size report
//!
//! Walks the web build output and sums file sizes, grouped by extension.

use deploid_cli::{format_count, format_size};
use deploid_core::{Error, Logger, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files listed individually in the report
const LARGEST_SHOWN: usize = 5;

/// One file of the build output
#[derive(Debug, Clone, Serialize)]
pub struct BundleFile {
    /// Path relative to the output directory
    pub path: PathBuf,
    pub size: u64,
}

/// Summary of a build output directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct BundleReport {
    pub total_size: u64,
    pub file_count: usize,
    /// Total bytes per lowercase extension (`""` for none)
    pub by_extension: BTreeMap<String, u64>,
    /// Largest files, biggest first
    pub largest: Vec<BundleFile>,
}

/// Analyze a build output directory
pub fn analyze(web_dir: &Path) -> Result<BundleReport> {
    let mut report = BundleReport::default();
    let mut files = Vec::new();

    for entry in WalkDir::new(web_dir).follow_links(false) {
        let entry = entry.map_err(|e| Error::io(format!("Failed to walk {}: {}", web_dir.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let ext = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        report.total_size += size;
        report.file_count += 1;
        *report.by_extension.entry(ext).or_default() += size;

        let relative = entry.path().strip_prefix(web_dir).unwrap_or(entry.path());
        files.push(BundleFile {
            path: relative.to_path_buf(),
            size,
        });
    }

    files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    files.truncate(LARGEST_SHOWN);
    report.largest = files;
    Ok(report)
}

impl BundleReport {
    /// Write the report through the logger: total at info, detail at debug
    pub fn log(&self, logger: &Logger) {
        logger.info(format!(
            "Web bundle: {} in {}",
            format_size(self.total_size),
            format_count(self.file_count, "file", "files")
        ));

        let mut kinds: Vec<_> = self.by_extension.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1));
        for (ext, size) in kinds {
            let label = if ext.is_empty() { "(none)" } else { ext.as_str() };
            logger.debug(format!("  .{:<8} {}", label, format_size(*size)));
        }
        for file in &self.largest {
            logger.debug(format!("  {} - {}", file.path.display(), format_size(file.size)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploid_core::LogLevel;
    use std::fs;
    use tempfile::TempDir;

    fn sample_dist() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("index.html"), vec![b'a'; 100]).unwrap();
        fs::write(dir.path().join("assets/app.js"), vec![b'b'; 3000]).unwrap();
        fs::write(dir.path().join("assets/vendor.JS"), vec![b'c'; 2000]).unwrap();
        fs::write(dir.path().join("assets/site.css"), vec![b'd'; 500]).unwrap();
        dir
    }

    #[test]
    fn test_totals_and_grouping() {
        let dir = sample_dist();
        let report = analyze(dir.path()).unwrap();

        assert_eq!(report.file_count, 4);
        assert_eq!(report.total_size, 5600);
        assert_eq!(report.by_extension["js"], 5000);
        assert_eq!(report.by_extension["css"], 500);
        assert_eq!(report.largest[0].path, PathBuf::from("assets/app.js"));
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(analyze(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_log_summary() {
        let dir = sample_dist();
        let report = analyze(dir.path()).unwrap();
        let (logger, buffer) = Logger::capture(LogLevel::Info);
        report.log(&logger);

        let out = buffer.contents();
        assert!(out.contains("info: Web bundle: 5.47 KB in 4 files"));
        assert!(!out.contains("app.js"));
    }
}
