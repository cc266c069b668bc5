//! `tierline`: a parallel DAG pipeline orchestration engine.
//!
//! Callers declare a set of [`StageSpec`]s — named units of work, each with
//! an integer tier and a shell command — and hand them to a [`Pipeline`].
//! Resolution groups stages into tier-ordered waves, validating the tier
//! assignment as a dependency DAG along the way; execution then runs each
//! wave's stages concurrently, subject to a concurrency budget, propagating
//! SKIPPED status through any stage whose dependency failed or was itself
//! skipped. The resulting [`PipelineResult`] reports per-stage outcomes plus
//! the observed speedup over a sequential baseline.
//!
//! ```no_run
//! use tierline::{Pipeline, PipelineConfig, StageSpec};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new(".");
//! let stages = vec![
//!     StageSpec::new("lint", 1, "cargo clippy"),
//!     StageSpec::new("test", 1, "cargo test"),
//!     StageSpec::new("deploy", 2, "echo deploying").depends_on(["lint", "test"]),
//! ];
//! let result = Pipeline::new(config, stages).run().await?;
//! println!("speedup: {:.2}x", result.speedup_factor);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//! - [`stage`]: stage declarations and mutable per-run state
//! - [`config`]: run-level configuration
//! - [`resolver`]: dependency validation and wave computation
//! - [`supervisor`]: single-stage subprocess execution
//! - [`executor`]: per-wave concurrent scheduling and skip propagation
//! - [`result`]: final result assembly
//! - [`telemetry`]: optional human-readable rendering
//! - [`pipeline`]: the top-level run loop
//! - [`errors`]: the error taxonomy shared across modules

pub mod config;
pub mod errors;
pub mod executor;
pub mod pipeline;
pub mod resolver;
pub mod result;
pub mod stage;
pub mod supervisor;
pub mod telemetry;

pub use config::PipelineConfig;
pub use errors::{PipelineError, ResolverError, SupervisorError};
pub use pipeline::Pipeline;
pub use result::{PipelineResult, StageRecord};
pub use stage::{Stage, StageSpec, StageStatus};
