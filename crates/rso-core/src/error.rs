//! Crate-wide error taxonomy.
//!
//! Every fallible operation in `rso-core`, `rso-solver`, `rso-reschedule`, and
//! `rso-assign` returns `Result<T, SchedulingError>`. Fatal kinds abort the
//! transaction they occur in; non-fatal kinds (`CandidateUnavailable`,
//! `DependencyWarning`) are collected into a response alongside a successful
//! commit rather than returned as an `Err`.

use thiserror::Error;

/// The single error vocabulary shared across the scheduling engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulingError {
    /// The dependency graph is not acyclic.
    #[error("dependency cycle detected among tasks: {tasks:?}")]
    CycleDetected { tasks: Vec<String> },

    /// Post-solve capacity validation found an over-allocation. Indicates a
    /// builder bug, not a user input error.
    #[error("capacity violation for pool `{pool}` at unit {unit}: demand {demand} exceeds capacity {capacity}")]
    CapacityViolation {
        pool: String,
        unit: i64,
        demand: i64,
        capacity: i64,
    },

    /// The solver returned Infeasible under hard constraints.
    #[error("model is infeasible: {reason}")]
    InfeasibleModel { reason: String },

    /// No feasible solution was found within the solver's time caps.
    #[error("solver timed out after {elapsed_ms}ms without a feasible solution")]
    SolverTimeout { elapsed_ms: u64 },

    /// An event was submitted for a task state that does not permit it.
    #[error("event `{event}` is not valid from state `{from_state}` for task {task_id}")]
    InvalidEventTransition {
        task_id: String,
        event: String,
        from_state: String,
    },

    /// Store lookup failed: task, dependency, or resource id is unknown.
    #[error("task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// An operation was attempted on a resource pool that doesn't exist.
    #[error("resource pool not found: {pool}")]
    PoolNotFound { pool: String },

    /// Internal invariant violated; always a bug, never user input.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal finding surfaced in a response alongside committed changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulingWarning {
    /// No employee/equipment satisfied a requirement within its window.
    CandidateUnavailable { task_id: String, group: String },
    /// A manual reschedule would violate a predecessor's anchor.
    DependencyWarning {
        task_id: String,
        predecessor_id: String,
        detail: String,
    },
    /// A task's demand for a pool exceeded capacity and was clamped.
    CapacityClamped {
        pool: String,
        task_id: String,
        requested: i64,
        clamped_to: i64,
    },
}

impl std::fmt::Display for SchedulingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingWarning::CandidateUnavailable { task_id, group } => {
                write!(f, "no candidate available for task {task_id} in group `{group}`")
            }
            SchedulingWarning::DependencyWarning {
                task_id,
                predecessor_id,
                detail,
            } => write!(
                f,
                "task {task_id} reschedule may violate dependency on {predecessor_id}: {detail}"
            ),
            SchedulingWarning::CapacityClamped {
                pool,
                task_id,
                requested,
                clamped_to,
            } => write!(
                f,
                "task {task_id} demand {requested} for pool `{pool}` clamped to capacity {clamped_to}"
            ),
        }
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
