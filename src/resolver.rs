//! Dependency resolution: turns a caller-supplied stage set into an ordered
//! list of waves, or rejects it as a [`ResolverError`].
//!
//! Stages are collected into a name-indexed map, validated in passes, then
//! grouped into an ordered wave list. Cycle detection uses `petgraph`'s
//! strongly connected components.

use rustc_hash::FxHashMap;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::DiGraph;

use tracing::instrument;

use crate::errors::ResolverError;
use crate::stage::StageSpec;

/// One wave: the stage names sharing a single tier, in declaration order
/// (declaration order is preserved for determinism, though execution within
/// a wave is unordered per the engine's contract).
pub type Wave = Vec<String>;

/// Validate a stage set and compute its wave ordering.
///
/// Validation runs in four passes, each over the full stage set:
/// 1. name uniqueness
/// 2. self- and unknown-dependency references
/// 3. dependency cycles (independent of tier, via SCC)
/// 4. the tier invariant (positive tiers; dependencies strictly earlier-tier
///    than their dependent)
///
/// Running cycle detection before the tier invariant check means a genuine
/// cycle is always reported as [`ResolverError::Cycle`] rather than
/// incidentally caught by the tier check (a cycle necessarily contains a
/// non-increasing-tier edge, since tiers can't decrease all the way around
/// a loop, so without this ordering the cycle branch would never fire).
///
/// # Errors
/// Returns [`ResolverError`] per the causes above.
#[instrument(skip(stages), fields(stage_count = stages.len()), err)]
pub fn resolve(stages: &[StageSpec]) -> Result<Vec<Wave>, ResolverError> {
    let by_name = index_by_name(stages)?;
    check_references(stages, &by_name)?;
    check_acyclic(stages)?;
    check_tier_invariant(stages, &by_name)?;
    Ok(group_into_waves(stages))
}

fn index_by_name(stages: &[StageSpec]) -> Result<FxHashMap<&str, &StageSpec>, ResolverError> {
    let mut by_name: FxHashMap<&str, &StageSpec> = FxHashMap::default();
    for spec in stages {
        if by_name.insert(spec.name.as_str(), spec).is_some() {
            return Err(ResolverError::DuplicateStage {
                name: spec.name.clone(),
            });
        }
    }
    Ok(by_name)
}

fn check_references(
    stages: &[StageSpec],
    by_name: &FxHashMap<&str, &StageSpec>,
) -> Result<(), ResolverError> {
    for spec in stages {
        for dep in &spec.depends_on {
            if dep == &spec.name {
                return Err(ResolverError::SelfDependency {
                    stage: spec.name.clone(),
                });
            }
            if !by_name.contains_key(dep.as_str()) {
                return Err(ResolverError::UnknownDependency {
                    stage: spec.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_acyclic(stages: &[StageSpec]) -> Result<(), ResolverError> {
    let mut graph = DiGraph::<&str, ()>::new();
    let mut node_ix = FxHashMap::default();
    for spec in stages {
        node_ix.insert(spec.name.as_str(), graph.add_node(spec.name.as_str()));
    }
    for spec in stages {
        let to = node_ix[spec.name.as_str()];
        for dep in &spec.depends_on {
            let from = node_ix[dep.as_str()];
            graph.add_edge(from, to, ());
        }
    }

    for component in kosaraju_scc(&graph) {
        if component.len() > 1 {
            let mut path: Vec<String> = component.iter().map(|ix| graph[*ix].to_string()).collect();
            path.sort();
            return Err(ResolverError::Cycle { path });
        }
    }
    Ok(())
}

fn check_tier_invariant(
    stages: &[StageSpec],
    by_name: &FxHashMap<&str, &StageSpec>,
) -> Result<(), ResolverError> {
    for spec in stages {
        if spec.tier <= 0 {
            return Err(ResolverError::NonPositiveTier {
                stage: spec.name.clone(),
                tier: spec.tier,
            });
        }
        for dep in &spec.depends_on {
            let dep_spec = by_name[dep.as_str()];
            if dep_spec.tier >= spec.tier {
                return Err(ResolverError::NonIncreasingTierEdge {
                    stage: spec.name.clone(),
                    stage_tier: spec.tier,
                    dependency: dep.clone(),
                    dependency_tier: dep_spec.tier,
                });
            }
        }
    }
    Ok(())
}

fn group_into_waves(stages: &[StageSpec]) -> Vec<Wave> {
    let max_tier = stages.iter().map(|s| s.tier).max().unwrap_or(0);
    let mut waves = Vec::new();
    for tier in 1..=max_tier {
        let wave: Wave = stages
            .iter()
            .filter(|s| s.tier == tier)
            .map(|s| s.name.clone())
            .collect();
        if !wave.is_empty() {
            waves.push(wave);
        }
    }
    waves
}
