mod common;

use tierline::resolver::resolve;
use tierline::ResolverError;

use common::stage;

#[test]
fn diamond_dependency_resolves_in_three_waves() {
    let stages = vec![
        stage("build", 1, "true"),
        stage("lint", 2, "true").depends_on(["build"]),
        stage("test", 2, "true").depends_on(["build"]),
        stage("deploy", 3, "true").depends_on(["lint", "test"]),
    ];
    let waves = resolve(&stages).unwrap();
    assert_eq!(waves.len(), 3);
    assert_eq!(waves[0], vec!["build".to_string()]);
    let mut wave_two = waves[1].clone();
    wave_two.sort();
    assert_eq!(wave_two, vec!["lint".to_string(), "test".to_string()]);
    assert_eq!(waves[2], vec!["deploy".to_string()]);
}

#[test]
fn gap_in_tier_numbering_produces_no_empty_waves() {
    let stages = vec![stage("a", 1, "true"), stage("b", 5, "true").depends_on(["a"])];
    let waves = resolve(&stages).unwrap();
    assert_eq!(waves.len(), 2);
}

#[test]
fn invalid_dag_reports_before_any_execution_would_start() {
    let stages = vec![stage("a", 1, "true").depends_on(["missing"])];
    let err = resolve(&stages).unwrap_err();
    assert!(matches!(err, ResolverError::UnknownDependency { .. }));
}
