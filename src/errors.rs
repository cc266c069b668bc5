//! Error taxonomy for the pipeline engine.
//!
//! Pairs [`thiserror`] for `Display`/`source` wiring with
//! [`miette::Diagnostic`] for rich, human-facing diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Failures raised while resolving a stage set into an ordered wave list.
///
/// Every variant here is fatal to [`crate::pipeline::Pipeline::run`] — per
/// the engine's contract, `InvalidDAG` is the only error kind surfaced
/// before any stage runs.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ResolverError {
    #[error("duplicate stage name: {name}")]
    #[diagnostic(
        code(tierline::resolver::duplicate_stage),
        help("Stage names must be unique within a run.")
    )]
    DuplicateStage { name: String },

    #[error("stage {stage} depends on undefined stage {dependency}")]
    #[diagnostic(
        code(tierline::resolver::unknown_dependency),
        help("Every depends_on entry must name a stage declared in the same run.")
    )]
    UnknownDependency { stage: String, dependency: String },

    #[error("stage {stage} depends on itself")]
    #[diagnostic(code(tierline::resolver::self_dependency))]
    SelfDependency { stage: String },

    #[error("dependency cycle detected: {}", path.join(" -> "))]
    #[diagnostic(
        code(tierline::resolver::cycle),
        help("Break the cycle by removing or re-tiering one of the listed edges.")
    )]
    Cycle { path: Vec<String> },

    #[error("stage {stage} has non-positive tier {tier}")]
    #[diagnostic(
        code(tierline::resolver::non_positive_tier),
        help("Tiers must be positive integers starting at 1.")
    )]
    NonPositiveTier { stage: String, tier: i64 },

    #[error(
        "stage {stage} (tier {stage_tier}) depends on {dependency} (tier {dependency_tier}), which is not strictly earlier"
    )]
    #[diagnostic(
        code(tierline::resolver::non_increasing_tier_edge),
        help(
            "A dependency must live in a strictly lower tier than its dependent. \
             Same-wave and backward edges can never be satisfied at wave entry."
        )
    )]
    NonIncreasingTierEdge {
        stage: String,
        stage_tier: i64,
        dependency: String,
        dependency_tier: i64,
    },
}

/// Failures local to one stage's subprocess supervision.
///
/// These are never returned from [`crate::pipeline::Pipeline::run`] as a
/// Rust `Err` — they are folded into the owning [`crate::stage::Stage`]'s
/// `error` field and reported as a FAILED status, per the engine's
/// propagation policy (a stage's own failure never escapes to its peers).
#[derive(Debug, Error, Diagnostic)]
pub enum SupervisorError {
    #[error("failed to spawn subprocess: {0}")]
    #[diagnostic(code(tierline::supervisor::spawn))]
    Spawn(#[source] std::io::Error),

    #[error("I/O error while supervising subprocess: {0}")]
    #[diagnostic(code(tierline::supervisor::io))]
    Io(#[source] std::io::Error),
}

/// Top-level error returned by [`crate::pipeline::Pipeline::run`].
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidDag(#[from] ResolverError),

    #[error("workspace directory does not exist: {path}")]
    #[diagnostic(
        code(tierline::pipeline::workspace_missing),
        help("Create the directory or point PipelineConfig::workspace at an existing one.")
    )]
    WorkspaceMissing { path: String },

    #[error("wave join task panicked or was cancelled: {0}")]
    #[diagnostic(code(tierline::pipeline::join))]
    Join(#[from] tokio::task::JoinError),
}
