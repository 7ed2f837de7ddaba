//! Project fixture loading: the small JSON or TOML document `check` and
//! `schedule` seed an `InMemoryStore` from, matching the teacher's own
//! `parse_file` entry point but over this engine's domain types directly
//! (they already derive `Serialize`/`Deserialize`) rather than a bespoke
//! DSL grammar.

use anyhow::Context;
use chrono::NaiveDate;
use rso_core::{
    CapacityTable, Dependency, InMemoryStore, PoolEntity, Requirement, Task,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ProjectFixture {
    pub name: String,
    pub start: NaiveDate,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub capacity: CapacityTable,
    #[serde(default)]
    pub employees: Vec<PoolEntity>,
    #[serde(default)]
    pub equipment: Vec<PoolEntity>,
}

/// Loads a fixture from `path`, dispatching on extension (`.json` or
/// `.toml`); any other extension is rejected rather than guessed at.
pub fn load_fixture(path: &Path) -> anyhow::Result<ProjectFixture> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read project file '{}'", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("failed to parse '{}' as JSON", path.display())),
        Some("toml") => toml::from_str(&text)
            .with_context(|| format!("failed to parse '{}' as TOML", path.display())),
        other => anyhow::bail!(
            "unsupported project file extension {:?} for '{}'; use .json or .toml",
            other,
            path.display()
        ),
    }
}

/// Seeds a fresh `InMemoryStore` with a fixture's entities. Requirements
/// not listed default to "no pool resources" via `requirement_of`'s own
/// fallback, so a fixture only needs to list tasks that actually need a
/// skill or equipment group.
pub fn seed_store(store: &InMemoryStore, fixture: ProjectFixture) {
    for task in fixture.tasks {
        store.seed_task(task);
    }
    for dep in fixture.dependencies {
        store.seed_dependency(dep);
    }
    for req in fixture.requirements {
        store.seed_requirement(req);
    }
    store.seed_capacity(fixture.capacity);
    for employee in fixture.employees {
        store.seed_employee(employee);
    }
    for unit in fixture.equipment {
        store.seed_equipment(unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_minimal_json_fixture() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "name": "Test Project",
                "start": "2026-01-05",
                "tasks": [
                    {{"id": "a", "name": "Dig trench", "wbs_code": "", "estimated_hours": "4",
                      "phase": "activeConstruction", "priority": "Medium", "preemptable": false,
                      "project_id": null}}
                ]
            }}"#
        )
        .unwrap();

        let fixture = load_fixture(file.path()).unwrap();
        assert_eq!(fixture.tasks.len(), 1);
        assert_eq!(fixture.tasks[0].id, "a");
        assert!(fixture.dependencies.is_empty());
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(load_fixture(file.path()).is_err());
    }
}
