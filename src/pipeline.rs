//! Top-level entry point: resolves a stage set, runs its waves in order,
//! and aggregates the result.
//!
//! A single method owns the whole run's lifecycle end to end, driving a
//! wave loop rather than a single-graph traversal. Structured `tracing`
//! events (`stage_started`, `stage_passed`, `stage_failed`, `stage_skipped`,
//! `stage_timeout`, `tier_started`, `pipeline_aborted`, `pipeline_complete`)
//! mark every state transition a host might want to observe.

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::executor;
use crate::resolver::{self, Wave};
use crate::result::{self, PipelineResult};
use crate::stage::{Stage, StageSpec, StageStatus};

/// A fully configured, not-yet-run pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<StageSpec>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, stages: Vec<StageSpec>) -> Self {
        Self { config, stages }
    }

    /// Resolve the stage set into waves, then run every wave in tier order.
    ///
    /// A wave in which every stage ends FAILED or SKIPPED aborts the run:
    /// no further wave is launched, and every stage in a later wave is
    /// reported SKIPPED rather than PENDING.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidDag`] if the stage set fails
    /// resolution, [`PipelineError::WorkspaceMissing`] if `config.workspace`
    /// does not exist, or [`PipelineError::Join`] if a stage task panics.
    #[instrument(skip(self), fields(stage_count = self.stages.len()), err)]
    pub async fn run(self) -> Result<PipelineResult, PipelineError> {
        if !self.config.workspace.is_dir() {
            return Err(PipelineError::WorkspaceMissing {
                path: self.config.workspace.display().to_string(),
            });
        }

        let waves: Vec<Wave> = resolver::resolve(&self.stages)?;
        let mut stages: FxHashMap<String, Stage> = self
            .stages
            .into_iter()
            .map(|spec| (spec.name.clone(), Stage::new(spec)))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let started = Instant::now();
        let mut aborted = false;

        for (tier_index, wave) in waves.iter().enumerate() {
            if aborted {
                break;
            }
            info!(tier = tier_index + 1, size = wave.len(), "tier_started");

            let outcome = executor::run_wave(wave, &mut stages, &self.config, &semaphore).await?;
            log_wave(wave, &stages);

            if outcome.fully_failed {
                warn!(tier = tier_index + 1, "pipeline_aborted");
                aborted = true;
            }
        }

        let parallel_actual_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = result::finalize(stages, parallel_actual_ms);
        info!(
            speedup = result.speedup_factor,
            any_failed = result.any_failed(),
            "pipeline_complete"
        );
        Ok(result)
    }
}

fn log_wave(wave: &Wave, stages: &FxHashMap<String, Stage>) {
    for name in wave {
        let Some(stage) = stages.get(name) else {
            continue;
        };
        match stage.status {
            StageStatus::Passed => info!(stage = %name, duration_ms = stage.duration_ms, "stage_passed"),
            StageStatus::Failed if stage.error.starts_with("Timeout after") => {
                warn!(stage = %name, "stage_timeout");
            }
            StageStatus::Failed => warn!(stage = %name, error = %stage.error, "stage_failed"),
            StageStatus::Skipped => info!(stage = %name, reason = %stage.error, "stage_skipped"),
            StageStatus::Pending | StageStatus::Running => {}
        }
    }
}
