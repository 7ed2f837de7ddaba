//! Domain entities: tasks, dependencies, requirements, capacities, schedule
//! records, segments, progress, and assignments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Work-breakdown codes in this set identify structural rows (e.g. project
/// headers) rather than schedulable work and are excluded from the task set
/// the CP model sees.
pub const RESERVED_WBS_PREFIXES: &[&str] = &["1.1", "1.2", "1.3", "1.4"];

pub fn is_reserved_wbs(code: &str) -> bool {
    RESERVED_WBS_PREFIXES.iter().any(|p| code.starts_with(p))
}

/// Fixed total order across project phases (§4.3).
pub const PHASE_ORDER: &[&str] = &[
    "sales",
    "preConstruction",
    "activeConstruction",
    "postConstruction",
];

pub fn phase_rank(phase: &str) -> Option<usize> {
    PHASE_ORDER.iter().position(|p| *p == phase)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub fn weight(self) -> i64 {
        match self {
            Priority::High => 100,
            Priority::Medium => 10,
            Priority::Low => 1,
        }
    }
}

/// A schedulable unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub wbs_code: String,
    pub estimated_hours: Decimal,
    pub phase: String,
    pub priority: Priority,
    pub preemptable: bool,
    pub project_id: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>, estimated_hours: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            wbs_code: String::new(),
            estimated_hours,
            phase: String::new(),
            priority: Priority::Medium,
            preemptable: false,
            project_id: None,
        }
    }

    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn preemptable(mut self, preemptable: bool) -> Self {
        self.preemptable = preemptable;
        self
    }

    pub fn wbs_code(mut self, code: impl Into<String>) -> Self {
        self.wbs_code = code.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DependencyType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

/// A directed edge: `successor` depends on `predecessor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor_id: String,
    pub successor_id: String,
    pub dep_type: DependencyType,
    /// Lag in calendar hours; may be any non-negative rational and may
    /// exceed a working day.
    pub lag_hours: f64,
}

impl Dependency {
    pub fn new(predecessor_id: impl Into<String>, successor_id: impl Into<String>) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            dep_type: DependencyType::default(),
            lag_hours: 0.0,
        }
    }

    pub fn of_type(mut self, dep_type: DependencyType) -> Self {
        self.dep_type = dep_type;
        self
    }

    pub fn lag(mut self, lag_hours: f64) -> Self {
        self.lag_hours = lag_hours;
        self
    }
}

/// Per-task demand: skill-group or equipment-category -> count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirement {
    pub task_id: String,
    pub skill_groups: HashMap<String, i64>,
    pub equipment_categories: HashMap<String, i64>,
}

impl Requirement {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            skill_groups: HashMap::new(),
            equipment_categories: HashMap::new(),
        }
    }

    pub fn needs_skill(mut self, group: impl Into<String>, count: i64) -> Self {
        self.skill_groups.insert(group.into(), count);
        self
    }

    pub fn needs_equipment(mut self, category: impl Into<String>, count: i64) -> Self {
        self.equipment_categories.insert(category.into(), count);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.skill_groups.is_empty() && self.equipment_categories.is_empty()
    }
}

/// Immutable snapshot of pool capacities taken at model-build time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityTable {
    pub skill_capacity: HashMap<String, i64>,
    pub equipment_capacity: HashMap<String, i64>,
}

impl CapacityTable {
    pub fn skill(&self, group: &str) -> i64 {
        self.skill_capacity.get(group).copied().unwrap_or(0)
    }

    pub fn equipment(&self, category: &str) -> i64 {
        self.equipment_capacity.get(category).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Scheduled,
    InProgress,
    Paused,
    OnHold,
    Blocked,
    Completed,
    Skipped,
}

impl TaskStatus {
    /// States in which the Schedule Writer must preserve the existing
    /// status rather than reset it to `Scheduled` (§4.5).
    pub fn is_non_resettable(self) -> bool {
        matches!(
            self,
            TaskStatus::InProgress
                | TaskStatus::Paused
                | TaskStatus::OnHold
                | TaskStatus::Completed
                | TaskStatus::Skipped
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Skipped)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Scheduled => "Scheduled",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Paused => "Paused",
            TaskStatus::OnHold => "OnHold",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::Completed => "Completed",
            TaskStatus::Skipped => "Skipped",
        };
        write!(f, "{s}")
    }
}

/// A task's current planned (and, once underway, actual) span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub task_id: String,
    pub planned_start: i64,
    pub planned_end: i64,
    pub actual_start: Option<i64>,
    pub actual_end: Option<i64>,
    pub status: TaskStatus,
}

impl ScheduleRecord {
    pub fn new(task_id: impl Into<String>, planned_start: i64, planned_end: i64) -> Self {
        Self {
            task_id: task_id.into(),
            planned_start,
            planned_end,
            actual_start: None,
            actual_end: None,
            status: TaskStatus::Scheduled,
        }
    }

    pub fn duration(&self) -> i64 {
        self.planned_end - self.planned_start
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSegment {
    pub task_id: String,
    pub segment_index: u32,
    pub planned_start: i64,
    pub planned_end: i64,
    pub actual_start: Option<i64>,
    pub actual_end: Option<i64>,
    pub completion_percentage: u8,
    pub is_carry_over: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub task_id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub status: TaskStatus,
    pub duration_minutes: i64,
    pub accumulated_minutes: i64,
}

impl ProgressEntry {
    pub fn completed_percentage(&self, planned_duration_minutes: i64) -> u8 {
        if planned_duration_minutes <= 0 {
            return 100;
        }
        let pct = (self.accumulated_minutes as f64 / planned_duration_minutes as f64) * 100.0;
        pct.clamp(0.0, 100.0).round() as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseEntry {
    pub task_id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub reason: String,
    pub duration_minutes: i64,
    pub is_on_hold: bool,
    pub expected_resume_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Dependency,
    ManualReschedule,
    Preemption,
    Delayed,
    CarryOver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub task_id: String,
    pub prior_start: i64,
    pub prior_end: i64,
    pub new_start: i64,
    pub new_end: i64,
    pub change_kind: ChangeKind,
    pub reason: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Employee,
    Equipment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: String,
    pub entity_id: String,
    pub kind: ResourceKind,
    pub is_initial: bool,
    pub is_modified: bool,
}

/// A concrete pool member: an employee (one or more skill groups) or an
/// equipment unit (one equipment category).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntity {
    pub id: String,
    pub display_name: String,
    pub kind: ResourceKind,
    pub groups: Vec<String>,
}

impl PoolEntity {
    pub fn matches(&self, group: &str) -> bool {
        self.groups
            .iter()
            .any(|g| g.eq_ignore_ascii_case(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reserved_wbs_prefixes_excluded() {
        assert!(is_reserved_wbs("1.1.2"));
        assert!(is_reserved_wbs("1.3"));
        assert!(!is_reserved_wbs("2.1"));
    }

    #[test]
    fn phase_order_is_total_and_fixed() {
        assert_eq!(phase_rank("sales"), Some(0));
        assert_eq!(phase_rank("postConstruction"), Some(3));
        assert!(phase_rank("sales") < phase_rank("preConstruction"));
        assert_eq!(phase_rank("unknown"), None);
    }

    #[test]
    fn status_preservation_rule() {
        assert!(TaskStatus::InProgress.is_non_resettable());
        assert!(TaskStatus::Completed.is_non_resettable());
        assert!(!TaskStatus::Scheduled.is_non_resettable());
    }

    #[test]
    fn task_builder_sets_fields() {
        let t = Task::new("t1", "Pour foundation", dec!(8))
            .phase("activeConstruction")
            .priority(Priority::High)
            .preemptable(true);
        assert_eq!(t.phase, "activeConstruction");
        assert_eq!(t.priority, Priority::High);
        assert!(t.preemptable);
    }

    #[test]
    fn requirement_empty_means_no_pool_resources() {
        let r = Requirement::new("t1");
        assert!(r.is_empty());
        let r2 = r.needs_skill("engineering", 1);
        assert!(!r2.is_empty());
    }

    #[test]
    fn pool_entity_matches_case_insensitive() {
        let e = PoolEntity {
            id: "e1".into(),
            display_name: "Alice".into(),
            kind: ResourceKind::Employee,
            groups: vec!["Engineering".into()],
        };
        assert!(e.matches("engineering"));
        assert!(!e.matches("plumbing"));
    }
}
