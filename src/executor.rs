//! Wave execution: drives one wave's stages to completion, honoring the
//! dependency-skip rule and a bounded concurrency budget.
//!
//! Each runnable stage gets its own task, bound by a semaphore; every
//! stage in a wave is launched or skipped before the next wave starts, and
//! the wave doesn't return until every launched task has joined.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::Semaphore;
use tracing::instrument;

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::resolver::Wave;
use crate::stage::{Stage, StageStatus};
use crate::supervisor;

/// Outcome of running one wave: whether the *entire* wave ended
/// FAILED/SKIPPED, which is what determines whether the engine aborts
/// remaining waves (§4.2: a lone failure among otherwise-passing siblings
/// does not abort the run, only a wave with no survivors does).
pub struct WaveOutcome {
    pub fully_failed: bool,
}

/// Run every stage named in `wave`, skipping those whose dependencies did
/// not pass, and launching the rest concurrently subject to
/// `config.max_concurrency`.
///
/// `stages` holds every stage in the run, keyed by name, so dependency
/// status can be read regardless of which wave produced it.
///
/// # Errors
/// Returns [`PipelineError::Join`] if a spawned stage task panics or is
/// cancelled; this is the only way a single stage's failure can escape to
/// the caller as a Rust `Err` rather than a FAILED status.
#[instrument(skip(stages, config), fields(wave_size = wave.len()), err)]
pub async fn run_wave(
    wave: &Wave,
    stages: &mut FxHashMap<String, Stage>,
    config: &PipelineConfig,
    semaphore: &Arc<Semaphore>,
) -> Result<WaveOutcome, PipelineError> {
    let mut runnable = Vec::new();
    for name in wave {
        if let Some(reason) = blocking_dependency_reason(name, stages) {
            if let Some(stage) = stages.get_mut(name) {
                stage.skip(&reason);
            }
        } else {
            runnable.push(name.clone());
        }
    }

    let mut handles = Vec::with_capacity(runnable.len());
    for name in &runnable {
        let mut stage = stages
            .remove(name)
            .expect("runnable stage name came from the stage map");
        let config = config.clone();
        let permit = Arc::clone(semaphore);
        handles.push((
            name.clone(),
            tokio::spawn(async move {
                let _permit = permit
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed during a run");
                supervisor::supervise(&mut stage, &config).await;
                stage
            }),
        ));
    }

    for (name, handle) in handles {
        let stage = handle.await.map_err(PipelineError::Join)?;
        stages.insert(name, stage);
    }

    let wave_had_runnable = !runnable.is_empty();
    let all_terminated_badly = wave.iter().all(|name| {
        stages
            .get(name)
            .is_some_and(|s| matches!(s.status, StageStatus::Failed | StageStatus::Skipped))
    });

    Ok(WaveOutcome {
        fully_failed: wave_had_runnable && all_terminated_badly,
    })
}

/// If any dependency of `name` is FAILED or SKIPPED, return the skip reason;
/// `None` means the stage is runnable (every dependency PASSED, or it has
/// none).
fn blocking_dependency_reason(name: &str, stages: &FxHashMap<String, Stage>) -> Option<String> {
    let stage = stages.get(name)?;
    for dep in &stage.spec.depends_on {
        match stages.get(dep).map(|s| s.status) {
            Some(StageStatus::Failed) => {
                return Some(format!("dependency_failed:{dep}"));
            }
            Some(StageStatus::Skipped) => {
                return Some(format!("dependency_skipped:{dep}"));
            }
            _ => {}
        }
    }
    None
}
