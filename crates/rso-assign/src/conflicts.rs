//! Post-pass conflict detection and clustering (§4.6 final paragraph),
//! grounded on `utf8proj-solver/src/bdd.rs`'s `BddConflictAnalyzer`: the
//! same shape (collect overlapping allocations per resource, encode "not
//! all of these run together" as a BDD, union-find the conflicting tasks
//! into clusters by shared resource) adapted from per-day resource units to
//! WTU-interval overlap on a pool entity, which is what §4.6 actually asks
//! the defensive pass to check.

use biodivine_lib_bdd::BddVariableSetBuilder;
use rso_core::{SchedulingResult, Store};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct ResourceConflict {
    pub entity_id: String,
    pub task_a: String,
    pub task_b: String,
}

#[derive(Debug, Clone)]
pub struct ConflictCluster {
    pub tasks: Vec<String>,
    pub entities: Vec<String>,
    pub estimated_contention: f32,
}

#[derive(Debug, Clone, Default)]
pub struct BddStats {
    pub variables: usize,
    pub nodes: usize,
}

#[derive(Debug, Clone)]
pub struct ConflictAnalysis {
    pub is_valid: bool,
    pub conflicts: Vec<ResourceConflict>,
    pub clusters: Vec<ConflictCluster>,
    pub stats: BddStats,
}

/// Scans every pool entity's assignments for overlapping non-terminal
/// planned spans. The assigner is expected to guarantee this set is
/// always empty; this pass exists to catch it if that guarantee is ever
/// broken.
pub fn detect_conflicts(store: &impl Store) -> SchedulingResult<ConflictAnalysis> {
    let mut by_entity: HashMap<String, Vec<(String, i64, i64)>> = HashMap::new();
    for assignment in store.all_assignments()? {
        let Some(sched) = store.schedule_of(&assignment.task_id)? else {
            continue;
        };
        if sched.status.is_terminal() {
            continue;
        }
        by_entity
            .entry(assignment.entity_id)
            .or_default()
            .push((assignment.task_id, sched.planned_start, sched.planned_end));
    }

    let mut conflicts = Vec::new();
    let mut resource_conflicts: HashMap<String, HashSet<String>> = HashMap::new();
    let mut task_resources: HashMap<String, HashSet<String>> = HashMap::new();

    for (entity_id, mut windows) in by_entity {
        windows.sort_by_key(|(_, start, _)| *start);
        for i in 0..windows.len() {
            for j in (i + 1)..windows.len() {
                let (ref task_a, start_a, end_a) = windows[i];
                let (ref task_b, start_b, end_b) = windows[j];
                if start_a < end_b && start_b < end_a {
                    conflicts.push(ResourceConflict {
                        entity_id: entity_id.clone(),
                        task_a: task_a.clone(),
                        task_b: task_b.clone(),
                    });
                    resource_conflicts
                        .entry(entity_id.clone())
                        .or_default()
                        .extend([task_a.clone(), task_b.clone()]);
                    task_resources.entry(task_a.clone()).or_default().insert(entity_id.clone());
                    task_resources.entry(task_b.clone()).or_default().insert(entity_id.clone());
                }
            }
        }
    }

    let clusters = cluster_conflicts(&resource_conflicts, &task_resources);
    let stats = build_mutual_exclusion_bdd(&clusters, &conflicts);

    Ok(ConflictAnalysis {
        is_valid: conflicts.is_empty(),
        conflicts,
        clusters,
        stats,
    })
}

fn cluster_conflicts(
    resource_conflicts: &HashMap<String, HashSet<String>>,
    task_resources: &HashMap<String, HashSet<String>>,
) -> Vec<ConflictCluster> {
    let mut all_tasks: HashSet<String> = HashSet::new();
    for tasks in resource_conflicts.values() {
        all_tasks.extend(tasks.iter().cloned());
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut clusters = Vec::new();

    for task_id in &all_tasks {
        if visited.contains(task_id) {
            continue;
        }
        let mut cluster_tasks = Vec::new();
        let mut cluster_entities: HashSet<String> = HashSet::new();
        let mut queue = vec![task_id.clone()];

        while let Some(current) = queue.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            cluster_tasks.push(current.clone());
            if let Some(entities) = task_resources.get(&current) {
                for entity_id in entities {
                    cluster_entities.insert(entity_id.clone());
                    if let Some(others) = resource_conflicts.get(entity_id) {
                        for other in others {
                            if !visited.contains(other) {
                                queue.push(other.clone());
                            }
                        }
                    }
                }
            }
        }

        let num_tasks = cluster_tasks.len();
        let num_entities = cluster_entities.len();
        let estimated_contention = if num_entities > 0 && num_tasks > 1 {
            ((num_tasks as f32 / num_entities as f32) - 1.0).clamp(0.0, 1.0)
        } else {
            0.0
        };

        cluster_tasks.sort();
        let mut entities_vec: Vec<String> = cluster_entities.into_iter().collect();
        entities_vec.sort();

        clusters.push(ConflictCluster {
            tasks: cluster_tasks,
            entities: entities_vec,
            estimated_contention,
        });
    }

    clusters.sort_by(|a, b| b.tasks.len().cmp(&a.tasks.len()));
    clusters
}

/// Encodes "not every task in a cluster can run as scheduled" as a BDD over
/// one boolean per task (true = keeps its current schedule), the same
/// pairwise-exclusion shape `BddConflictAnalyzer::build_validity_bdd` uses.
fn build_mutual_exclusion_bdd(clusters: &[ConflictCluster], conflicts: &[ResourceConflict]) -> BddStats {
    let all_tasks: HashSet<&str> = clusters.iter().flat_map(|c| c.tasks.iter().map(|t| t.as_str())).collect();
    if all_tasks.is_empty() {
        return BddStats { variables: 0, nodes: 1 };
    }

    let mut builder = BddVariableSetBuilder::new();
    let task_vars: HashMap<&str, _> = all_tasks.iter().map(|&t| (t, builder.make_variable(t))).collect();
    let vars = builder.build();

    let mut constraint = vars.mk_true();
    for conflict in conflicts {
        if let (Some(&a), Some(&b)) = (task_vars.get(conflict.task_a.as_str()), task_vars.get(conflict.task_b.as_str())) {
            let not_both = vars.mk_not_var(a).or(&vars.mk_not_var(b));
            constraint = constraint.and(&not_both);
        }
    }

    BddStats {
        variables: task_vars.len(),
        nodes: constraint.size(),
    }
}
