//! Shared helpers for integration tests: a scratch workspace directory plus
//! small constructors so each test file doesn't repeat the same
//! boilerplate.

use tempfile::TempDir;
use tierline::{PipelineConfig, StageSpec};

/// A throwaway workspace directory, removed when dropped.
pub fn workspace() -> TempDir {
    tempfile::tempdir().expect("failed to create scratch workspace")
}

pub fn config(workspace: &TempDir) -> PipelineConfig {
    PipelineConfig::new(workspace.path())
}

pub fn stage(name: &str, tier: i64, command: &str) -> StageSpec {
    StageSpec::new(name, tier, command)
}
