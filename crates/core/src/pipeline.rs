//! Sequential pipeline runner
//!
//! Steps run one at a time in the order given. The first failure stops the
//! pipeline and is returned to the caller unchanged; steps after it never
//! start. Each step is raced against the context's cancel token.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::step::{BoxedStep, StepOrigin};
use deploid_telemetry::{metrics, Timer};
use tracing::Instrument;

/// An ordered list of steps
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<BoxedStep>,
}

impl Pipeline {
    pub fn new(steps: Vec<BoxedStep>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: BoxedStep) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run every step in order, stopping at the first error
    pub async fn run(&self, ctx: &Context) -> Result<()> {
        let total = self.steps.len();
        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            if ctx.cancel_token().is_cancelled() {
                return Err(Error::cancelled(name));
            }

            match step.origin() {
                StepOrigin::Bundled => ctx.logger.debug(format!("step {}/{}: {}", index + 1, total, name)),
                StepOrigin::Local(path) => ctx.logger.debug(format!(
                    "step {}/{}: {} (project-local: {})",
                    index + 1,
                    total,
                    name,
                    path.display()
                )),
            }

            let span = tracing::info_span!("step", name = %name, index = index + 1, total);
            let timer = Timer::start(format!("step.{}", name));

            let outcome = async {
                tokio::select! {
                    result = step.run(ctx) => result,
                    _ = ctx.cancel_token().cancelled() => Err(Error::cancelled(name)),
                }
            }
            .instrument(span)
            .await;
            let elapsed = timer.stop();

            match outcome {
                Ok(()) => {
                    metrics().increment("steps.succeeded");
                    ctx.logger.debug(format!("step {} finished in {:.2?}", name, elapsed));
                }
                Err(err) => {
                    metrics().increment("steps.failed");
                    ctx.logger.debug(format!(
                        "step {} failed after {:.2?} ({}); {} remaining step(s) skipped",
                        name,
                        elapsed,
                        err.code,
                        total - index - 1
                    ));
                    tracing::debug!(error = %err, "step failed");
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
