//! Optional host-facing rendering of a finished run.
//!
//! The engine itself only emits `tracing` events (see [`crate::pipeline`]);
//! this module is a separate, opt-in convenience for hosts that want a
//! human-readable summary without wiring up their own `tracing` subscriber.

use std::fmt::Write as _;

use crate::result::PipelineResult;
use crate::stage::StageStatus;

/// Renders a [`PipelineResult`] as an ANSI-colored multi-line report.
pub struct PlainFormatter {
    /// Whether to emit ANSI color codes. Set to `false` for non-tty output.
    pub color: bool,
}

impl PlainFormatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Render the full report: a per-stage status line, sorted by tier then
    /// name, followed by the timing/speedup summary.
    pub fn render(&self, result: &PipelineResult) -> String {
        let mut out = String::new();
        let mut names: Vec<&String> = result.stages.keys().collect();
        names.sort_by_key(|name| (result.stages[*name].tier, (*name).clone()));

        for name in names {
            let record = &result.stages[name];
            let _ = writeln!(
                out,
                "{} {:<24} {:>6}ms tier={}",
                self.badge(record.status),
                name,
                record.duration_ms,
                record.tier
            );
            if record.status == StageStatus::Failed && !record.error_preview.is_empty() {
                let _ = writeln!(out, "      {}", record.error_preview);
            }
        }

        let _ = writeln!(
            out,
            "\ntotal={}ms sequential_baseline={}ms speedup={:.2}x",
            result.total_time_ms, result.sequential_baseline_ms, result.speedup_factor
        );
        out
    }

    fn badge(&self, status: StageStatus) -> String {
        let (label, code) = match status {
            StageStatus::Pending => ("PENDING", "90"),
            StageStatus::Running => ("RUNNING", "33"),
            StageStatus::Passed => ("PASSED ", "32"),
            StageStatus::Failed => ("FAILED ", "31"),
            StageStatus::Skipped => ("SKIPPED", "90"),
        };
        if self.color {
            format!("\x1b[{code}m{label}\x1b[0m")
        } else {
            label.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::StageRecord;
    use rustc_hash::FxHashMap;

    #[test]
    fn render_includes_every_stage_and_summary_line() {
        let mut stages = FxHashMap::default();
        stages.insert(
            "build".to_string(),
            StageRecord {
                status: StageStatus::Passed,
                tier: 1,
                duration_ms: 120,
                output_preview: String::new(),
                error_preview: String::new(),
            },
        );
        let result = PipelineResult {
            total_time_ms: 120,
            sequential_baseline_ms: 120,
            parallel_actual_ms: 120,
            speedup_factor: 1.0,
            stages,
        };
        let rendered = PlainFormatter::new(false).render(&result);
        assert!(rendered.contains("build"));
        assert!(rendered.contains("speedup=1.00x"));
    }
}
