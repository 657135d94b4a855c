//! The `assets` pipeline step

use crate::render::{write_png, IconSource};
use crate::sizes::{self, IconTarget};
use crate::Result;
use async_trait::async_trait;
use deploid_cli::progress::{self, ProgressBar};
use deploid_cli::format_count;
use deploid_core::{Context, Step};
use std::path::{Path, PathBuf};

/// Render every target from `source` under `output`, in order
pub fn generate(
    source: &IconSource,
    output: &Path,
    targets: &[IconTarget],
    bar: &ProgressBar,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(targets.len());
    for target in targets {
        let path = output.join(&target.path);
        let icon = source.render_square(target.size)?;
        write_png(&icon, &path)?;
        tracing::debug!(path = %path.display(), size = target.size, "icon written");
        bar.inc(1);
        written.push(path);
    }
    Ok(written)
}

/// Rasterizes the configured logo into Android, PWA and favicon sizes
#[derive(Debug, Default)]
pub struct AssetsStep;

#[async_trait]
impl Step for AssetsStep {
    fn name(&self) -> &str {
        "assets"
    }

    async fn run(&self, ctx: &Context) -> deploid_core::Result<()> {
        let settings = ctx.config.assets.clone().unwrap_or_default();
        let source_path = ctx.path(&settings.source);
        let output = ctx.path(&settings.output);

        ctx.logger.file_check("icon source", &source_path);
        if !source_path.is_file() {
            return ctx.missing_input(&source_path, "Icon source");
        }

        let source = IconSource::open(&source_path)?;
        ctx.logger.debug(format!("decoded {}", source.describe()));

        let targets = sizes::all();
        let bar = progress::progress_bar(targets.len() as u64, "Icons");
        match generate(&source, &output, &targets, &bar) {
            Ok(written) => {
                progress::finish_success(&bar, "icons rendered");
                ctx.logger.success(format!(
                    "Generated {} in {}",
                    format_count(written.len(), "icon", "icons"),
                    output.display()
                ));
                Ok(())
            }
            Err(err) => {
                progress::finish_error(&bar, "icon rendering failed");
                Err(err.into())
            }
        }
    }
}
