//! Stage declarations and their mutable per-run state.
//!
//! A [`StageSpec`] is the caller's immutable declaration of one unit of
//! work; a [`Stage`] wraps it with the mutable fields the scheduler and
//! supervisor fill in as the run progresses, keeping declarative topology
//! separate from per-run state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Maximum number of captured stdout bytes retained on a [`Stage`].
pub const OUTPUT_LIMIT: usize = 5000;
/// Maximum number of captured stderr/failure-reason bytes retained on a [`Stage`].
pub const ERROR_LIMIT: usize = 2000;
/// Maximum number of bytes surfaced in a [`crate::result::StageRecord`] preview.
pub const PREVIEW_LIMIT: usize = 200;

/// Terminal and transient status a stage can occupy during a run.
///
/// Valid transitions: `Pending -> Running -> {Passed, Failed}`, or
/// `Pending -> Skipped`. No other path is produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StageStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Skipped,
}

impl StageStatus {
    /// Whether this status is terminal (the stage will never transition again).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StageStatus::Passed | StageStatus::Failed | StageStatus::Skipped
        )
    }
}

/// The caller's immutable declaration of one stage.
///
/// Constructed before a run and never mutated during one; the scheduler
/// reads `depends_on` and `tier` only, the supervisor reads `command` and
/// `timeout_seconds` only.
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub name: String,
    pub tier: i64,
    pub command: String,
    pub depends_on: BTreeSet<String>,
    pub timeout_seconds: u64,
}

impl StageSpec {
    /// Build a stage with no dependencies and the default 300s timeout.
    pub fn new(name: impl Into<String>, tier: i64, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier,
            command: command.into(),
            depends_on: BTreeSet::new(),
            timeout_seconds: 300,
        }
    }

    #[must_use]
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// A stage's mutable run state, owned exclusively by the scheduler until
/// handed to a supervisor, and by that supervisor until it returns.
#[derive(Debug, Clone)]
pub struct Stage {
    pub spec: StageSpec,
    pub status: StageStatus,
    pub duration_ms: u64,
    pub output: String,
    pub error: String,
}

impl Stage {
    pub fn new(spec: StageSpec) -> Self {
        Self {
            spec,
            status: StageStatus::Pending,
            duration_ms: 0,
            output: String::new(),
            error: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn tier(&self) -> i64 {
        self.spec.tier
    }

    /// Mark this stage SKIPPED with the given reason, per the engine's
    /// dependency-skip rule. `duration_ms` is fixed at 0 for skipped stages.
    pub fn skip(&mut self, reason: &str) {
        self.status = StageStatus::Skipped;
        self.duration_ms = 0;
        self.error = reason.to_string();
    }

    /// Mark this stage SKIPPED with no reason recorded. Used to promote a
    /// stage that never got a wave to run in (a later tier after a
    /// full-wave abort) — it was never evaluated against its dependencies,
    /// so it carries none of the dependency-skip reasons `skip` sets.
    pub fn skip_silently(&mut self) {
        self.status = StageStatus::Skipped;
        self.duration_ms = 0;
    }
}

/// Truncate `s` to at most `limit` bytes, preserving the prefix and never
/// splitting a UTF-8 code point.
pub fn truncate_preserving_prefix(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut end = limit;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
