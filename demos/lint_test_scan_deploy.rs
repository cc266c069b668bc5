//! Runs a four-tier lint/test/scan/deploy pipeline against the current
//! directory, printing a colorized summary.
//!
//! ```sh
//! cargo run --example lint_test_scan_deploy
//! ```

use tierline::telemetry::PlainFormatter;
use tierline::{Pipeline, PipelineConfig, StageSpec};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let stages = vec![
        StageSpec::new("fmt_check", 1, "cargo fmt --check").timeout_seconds(60),
        StageSpec::new("lint", 1, "cargo clippy --all-targets").timeout_seconds(180),
        StageSpec::new("unit_tests", 2, "cargo test --lib")
            .depends_on(["lint"])
            .timeout_seconds(300),
        StageSpec::new("security_scan", 2, "cargo audit")
            .depends_on(["fmt_check"])
            .timeout_seconds(120),
        StageSpec::new("deploy", 3, "echo 'deploying release artifact'")
            .depends_on(["unit_tests", "security_scan"])
            .timeout_seconds(60),
    ];

    let config = PipelineConfig::new(".");
    let result = Pipeline::new(config, stages).run().await?;

    print!("{}", PlainFormatter::new(true).render(&result));
    if result.any_failed() {
        std::process::exit(1);
    }
    Ok(())
}
