//! Dependency graph acyclicity check.
//!
//! The CP model assumes the dependency graph is a DAG; this module is run
//! before model construction (and before any dependency write is accepted)
//! so a cycle surfaces as `SchedulingError::CycleDetected` rather than as an
//! unexplained solver infeasibility.

use rso_core::{Dependency, SchedulingError, SchedulingResult};
use std::collections::{HashMap, HashSet, VecDeque};

/// Kahn's algorithm: repeatedly remove nodes with in-degree zero. Any nodes
/// left over once no more can be removed form (or feed) a cycle.
pub fn topological_sort(
    task_ids: &[String],
    dependencies: &[Dependency],
) -> SchedulingResult<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> = task_ids.iter().map(|id| (id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for dep in dependencies {
        adjacency
            .entry(dep.predecessor_id.as_str())
            .or_default()
            .push(dep.successor_id.as_str());
        if let Some(deg) = in_degree.get_mut(dep.successor_id.as_str()) {
            *deg += 1;
        }
    }

    // Deterministic order: sort the initial zero-in-degree frontier.
    let mut frontier: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| *id)
        .collect();
    frontier.sort_unstable();
    let mut queue: VecDeque<&str> = frontier.into();

    let mut order = Vec::with_capacity(task_ids.len());
    let mut visited: HashSet<&str> = HashSet::new();

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        order.push(id.to_string());
        if let Some(successors) = adjacency.get(id) {
            let mut ready = Vec::new();
            for &succ in successors {
                if let Some(deg) = in_degree.get_mut(succ) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(succ);
                    }
                }
            }
            ready.sort_unstable();
            queue.extend(ready);
        }
    }

    if order.len() != task_ids.len() {
        let remaining: Vec<String> = task_ids
            .iter()
            .filter(|id| !visited.contains(id.as_str()))
            .cloned()
            .collect();
        return Err(SchedulingError::CycleDetected { tasks: remaining });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn linear_chain_sorts() {
        let tasks = ids(&["a", "b", "c"]);
        let deps = vec![Dependency::new("a", "b"), Dependency::new("b", "c")];
        let order = topological_sort(&tasks, &deps).unwrap();
        assert_eq!(order, ids(&["a", "b", "c"]));
    }

    #[test]
    fn diamond_sorts_without_duplicate_visits() {
        let tasks = ids(&["a", "b", "c", "d"]);
        let deps = vec![
            Dependency::new("a", "b"),
            Dependency::new("a", "c"),
            Dependency::new("b", "d"),
            Dependency::new("c", "d"),
        ];
        let order = topological_sort(&tasks, &deps).unwrap();
        assert_eq!(order.len(), 4);
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("a") < pos("c"));
        assert!(pos("b") < pos("d"));
        assert!(pos("c") < pos("d"));
    }

    #[test]
    fn cycle_is_detected() {
        let tasks = ids(&["a", "b", "c"]);
        let deps = vec![
            Dependency::new("a", "b"),
            Dependency::new("b", "c"),
            Dependency::new("c", "a"),
        ];
        let err = topological_sort(&tasks, &deps).unwrap_err();
        match err {
            SchedulingError::CycleDetected { tasks } => assert_eq!(tasks.len(), 3),
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn disconnected_tasks_sort_independently() {
        let tasks = ids(&["a", "b"]);
        let order = topological_sort(&tasks, &[]).unwrap();
        assert_eq!(order.len(), 2);
    }
}
