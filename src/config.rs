//! Run-level configuration.
//!
//! A small, cloneable struct with a `Default` that resolves sensible values
//! from the environment, plus builder-style `with_*` methods.

use std::path::PathBuf;

/// Settings that apply to an entire pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Working directory for every stage's subprocess.
    pub workspace: PathBuf,
    /// Upper bound on concurrently-running stages across the whole run.
    /// Defaults to the host's available parallelism.
    pub max_concurrency: usize,
    /// Shell interpreter invocation, as `(program, leading_args)`. Each
    /// stage's command is appended as the final argument, e.g.
    /// `("sh", vec!["-c".into()])` invokes `sh -c "<command>"`.
    pub shell: (String, Vec<String>),
}

impl PipelineConfig {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_shell(mut self, program: impl Into<String>, leading_args: Vec<String>) -> Self {
        self.shell = (program.into(), leading_args);
        self
    }

    fn default_max_concurrency() -> usize {
        dotenvy::dotenv().ok();
        if let Ok(raw) = std::env::var("TIERLINE_MAX_CONCURRENCY") {
            if let Ok(parsed) = raw.parse::<usize>() {
                if parsed > 0 {
                    return parsed;
                }
            }
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    fn default_shell() -> (String, Vec<String>) {
        if cfg!(windows) {
            ("cmd".to_string(), vec!["/C".to_string()])
        } else {
            ("sh".to_string(), vec!["-c".to_string()])
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            max_concurrency: Self::default_max_concurrency(),
            shell: Self::default_shell(),
        }
    }
}
