mod common;

use tierline::{Stage, StageStatus};

use common::{config, stage, workspace};

#[tokio::test]
async fn stage_runs_in_configured_workspace() {
    let ws = workspace();
    std::fs::write(ws.path().join("marker.txt"), "present").unwrap();
    let mut run = Stage::new(stage("ls_marker", 1, "test -f marker.txt"));
    tierline::supervisor::supervise(&mut run, &config(&ws)).await;
    assert_eq!(run.status, StageStatus::Passed);
}

#[tokio::test]
async fn timeout_fails_fast_with_deadline_as_duration() {
    let ws = workspace();
    let mut run = Stage::new(stage("sleep_forever", 1, "sleep 30").timeout_seconds(1));
    let started = std::time::Instant::now();
    tierline::supervisor::supervise(&mut run, &config(&ws)).await;
    assert_eq!(run.status, StageStatus::Failed);
    assert_eq!(run.duration_ms, 1000);
    assert!(run.error.starts_with("Timeout after 1s"));
    assert!(started.elapsed().as_secs() < 10);
}
