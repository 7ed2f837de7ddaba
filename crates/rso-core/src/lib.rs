//! Domain model, calendar arithmetic, and store adapter for the construction
//! project scheduling engine.
//!
//! This crate is the leaf layer: it defines the entities (`Task`,
//! `Dependency`, `ScheduleRecord`, ...), the working-time calendar bijection,
//! the crate-wide error taxonomy, and the `Store` trait every other
//! component builds on. It holds no scheduling algorithm itself -- that
//! lives in `rso-solver` (the CP model and solver driver) and
//! `rso-reschedule` (the event state machine and local repair engine).

pub mod calendar;
pub mod error;
pub mod model;
pub mod store;

pub use calendar::CalendarConfig;
pub use error::{SchedulingError, SchedulingResult, SchedulingWarning};
pub use model::{
    is_reserved_wbs, phase_rank, Assignment, CapacityTable, ChangeKind, ChangeLogEntry,
    Dependency, DependencyType, PauseEntry, PoolEntity, Priority, ProgressEntry, Requirement,
    ResourceKind, ScheduleRecord, Task, TaskSegment, TaskStatus, PHASE_ORDER,
};
pub use store::{InMemoryStore, Store, TransactionScope};
