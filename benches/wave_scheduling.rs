//! Benchmarks the two parts of a run most sensitive to stage-set size: wave
//! resolution (pure CPU, no subprocesses) and a full run of cheap stages
//! (wall-clock dominated by scheduling overhead rather than the commands
//! themselves).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tierline::{Pipeline, PipelineConfig, StageSpec};

fn layered_stages(tiers: usize, per_tier: usize) -> Vec<StageSpec> {
    let mut stages = Vec::with_capacity(tiers * per_tier);
    for tier in 1..=tiers {
        for i in 0..per_tier {
            let name = format!("t{tier}_s{i}");
            let mut spec = StageSpec::new(&name, tier as i64, "true");
            if tier > 1 {
                let deps: Vec<String> = (0..per_tier)
                    .map(|j| format!("t{}_s{j}", tier - 1))
                    .collect();
                spec = spec.depends_on(deps);
            }
            stages.push(spec);
        }
    }
    stages
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for per_tier in [4usize, 16, 64] {
        let stages = layered_stages(5, per_tier);
        group.bench_with_input(
            BenchmarkId::from_parameter(per_tier),
            &stages,
            |b, stages| {
                b.iter(|| tierline::resolver::resolve(stages).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_run(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let workspace = tempfile::tempdir().unwrap();

    let mut group = c.benchmark_group("run");
    group.sample_size(10);
    for per_tier in [2usize, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(per_tier),
            &per_tier,
            |b, &per_tier| {
                b.to_async(&runtime).iter(|| {
                    let stages = layered_stages(3, per_tier);
                    let config = PipelineConfig::new(workspace.path());
                    async move {
                        Pipeline::new(config, stages).run().await.unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_run);
criterion_main!(benches);
