//! Domain Store Adapter: the read/write boundary every other component goes
//! through, expressed as a trait so the CP model builder, resource assigner,
//! event state machine, and local repair engine never depend on a concrete
//! storage technology.
//!
//! The in-memory implementation here is the reference adapter: a single
//! mutex-guarded map set, matching the "exclusive writer per transaction,
//! multiple readers" rule of the concurrency model. A production deployment
//! is free to swap in a durable adapter behind the same trait without
//! touching the CP model, assigner, or rescheduler.

use crate::error::{SchedulingError, SchedulingResult};
use crate::model::{
    Assignment, CapacityTable, ChangeLogEntry, Dependency, PauseEntry, PoolEntity, ProgressEntry,
    Requirement, ScheduleRecord, Task, TaskSegment,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// The full read/write contract of §4.2.
pub trait Store {
    fn tasks(&self) -> SchedulingResult<Vec<Task>>;
    fn task(&self, id: &str) -> SchedulingResult<Task>;
    fn put_task(&self, task: Task) -> SchedulingResult<()>;
    fn dependencies_of(&self, task_id: &str) -> SchedulingResult<Vec<Dependency>>;
    fn dependents_of(&self, task_id: &str) -> SchedulingResult<Vec<Dependency>>;
    fn all_dependencies(&self) -> SchedulingResult<Vec<Dependency>>;
    fn put_dependency(&self, dep: Dependency) -> SchedulingResult<()>;

    fn requirement_of(&self, task_id: &str) -> SchedulingResult<Requirement>;
    fn capacity_table(&self) -> SchedulingResult<CapacityTable>;

    fn schedule_of(&self, task_id: &str) -> SchedulingResult<Option<ScheduleRecord>>;
    fn put_schedule(&self, record: ScheduleRecord) -> SchedulingResult<()>;
    fn all_schedules(&self) -> SchedulingResult<Vec<ScheduleRecord>>;

    fn segments_of(&self, task_id: &str) -> SchedulingResult<Vec<TaskSegment>>;
    fn append_segment(&self, segment: TaskSegment) -> SchedulingResult<()>;

    fn progress_of(&self, task_id: &str) -> SchedulingResult<Vec<ProgressEntry>>;
    fn append_progress(&self, entry: ProgressEntry) -> SchedulingResult<()>;

    fn pauses_of(&self, task_id: &str) -> SchedulingResult<Vec<PauseEntry>>;
    fn append_pause(&self, entry: PauseEntry) -> SchedulingResult<()>;

    fn append_change_log(&self, entry: ChangeLogEntry) -> SchedulingResult<()>;
    fn change_log_of(&self, task_id: &str) -> SchedulingResult<Vec<ChangeLogEntry>>;

    fn assignments_of(&self, task_id: &str) -> SchedulingResult<Vec<Assignment>>;
    fn assignments_for_entity(&self, entity_id: &str) -> SchedulingResult<Vec<Assignment>>;
    fn put_assignment(&self, assignment: Assignment) -> SchedulingResult<()>;
    fn all_assignments(&self) -> SchedulingResult<Vec<Assignment>>;

    fn employees(&self) -> SchedulingResult<Vec<PoolEntity>>;
    fn equipment(&self) -> SchedulingResult<Vec<PoolEntity>>;
}

#[derive(Debug, Default)]
struct Tables {
    tasks: HashMap<String, Task>,
    dependencies: Vec<Dependency>,
    requirements: HashMap<String, Requirement>,
    capacity: CapacityTable,
    schedules: HashMap<String, ScheduleRecord>,
    segments: HashMap<String, Vec<TaskSegment>>,
    progress: HashMap<String, Vec<ProgressEntry>>,
    pauses: HashMap<String, Vec<PauseEntry>>,
    change_log: HashMap<String, Vec<ChangeLogEntry>>,
    assignments: HashMap<String, Vec<Assignment>>,
    employees: Vec<PoolEntity>,
    equipment: Vec<PoolEntity>,
}

/// Reference `Store` implementation: all state behind one mutex. One event
/// yields one `transaction` call, and every mutation inside it either all
/// lands or all rolls back (achieved here by buffering into a scratch clone
/// and swapping it in only on `Ok`).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_task(&self, task: Task) {
        self.lock().tasks.insert(task.id.clone(), task);
    }

    pub fn seed_dependency(&self, dep: Dependency) {
        self.lock().dependencies.push(dep);
    }

    pub fn seed_requirement(&self, req: Requirement) {
        self.lock().requirements.insert(req.task_id.clone(), req);
    }

    pub fn seed_capacity(&self, capacity: CapacityTable) {
        self.lock().capacity = capacity;
    }

    pub fn seed_employee(&self, entity: PoolEntity) {
        self.lock().employees.push(entity);
    }

    pub fn seed_equipment(&self, entity: PoolEntity) {
        self.lock().equipment.push(entity);
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("store mutex poisoned")
    }

    /// Run `f` with the store's tables cloned out so a failure partway
    /// through leaves the committed state untouched; on `Ok` the scratch
    /// copy replaces the committed one atomically. This is the literal
    /// expression of "one event, one transaction."
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&TransactionScope<'_>) -> SchedulingResult<T>,
    ) -> SchedulingResult<T> {
        let snapshot = {
            let guard = self.lock();
            clone_tables(&guard)
        };
        let scratch = Mutex::new(snapshot);
        let scope = TransactionScope { scratch: &scratch };
        let result = f(&scope)?;
        let new_tables = scratch.into_inner().expect("scratch mutex poisoned");
        *self.lock() = new_tables;
        Ok(result)
    }
}

fn clone_tables(t: &Tables) -> Tables {
    Tables {
        tasks: t.tasks.clone(),
        dependencies: t.dependencies.clone(),
        requirements: t.requirements.clone(),
        capacity: t.capacity.clone(),
        schedules: t.schedules.clone(),
        segments: t.segments.clone(),
        progress: t.progress.clone(),
        pauses: t.pauses.clone(),
        change_log: t.change_log.clone(),
        assignments: t.assignments.clone(),
        employees: t.employees.clone(),
        equipment: t.equipment.clone(),
    }
}

impl Clone for Tables {
    fn clone(&self) -> Self {
        clone_tables(self)
    }
}

/// A live transaction: reads and writes go through the scratch copy, which
/// is only published to the store when the enclosing `transaction` call
/// returns `Ok`. Implements `Store` itself, so a closure given a
/// `&TransactionScope` reads and writes exactly as it would against the
/// committed store.
pub struct TransactionScope<'a> {
    scratch: &'a Mutex<Tables>,
}

/// Shared accessor every `Store` impl in this module delegates to, so the
/// committed store and an in-flight transaction's scratch copy behave
/// identically.
fn with_tables<T>(mutex: &Mutex<Tables>, f: impl FnOnce(&mut Tables) -> T) -> T {
    let mut guard = mutex.lock().expect("store mutex poisoned");
    f(&mut guard)
}

macro_rules! impl_store_for {
    ($ty:ty, $mutex_expr:expr) => {
        impl Store for $ty {
            fn tasks(&self) -> SchedulingResult<Vec<Task>> {
                Ok(with_tables($mutex_expr(self), |t| t.tasks.values().cloned().collect()))
            }

            fn task(&self, id: &str) -> SchedulingResult<Task> {
                with_tables($mutex_expr(self), |t| t.tasks.get(id).cloned())
                    .ok_or_else(|| SchedulingError::TaskNotFound { task_id: id.to_string() })
            }

            fn put_task(&self, task: Task) -> SchedulingResult<()> {
                with_tables($mutex_expr(self), |t| {
                    t.tasks.insert(task.id.clone(), task);
                });
                Ok(())
            }

            fn dependencies_of(&self, task_id: &str) -> SchedulingResult<Vec<Dependency>> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.dependencies
                        .iter()
                        .filter(|d| d.successor_id == task_id)
                        .cloned()
                        .collect()
                }))
            }

            fn dependents_of(&self, task_id: &str) -> SchedulingResult<Vec<Dependency>> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.dependencies
                        .iter()
                        .filter(|d| d.predecessor_id == task_id)
                        .cloned()
                        .collect()
                }))
            }

            fn all_dependencies(&self) -> SchedulingResult<Vec<Dependency>> {
                Ok(with_tables($mutex_expr(self), |t| t.dependencies.clone()))
            }

            fn put_dependency(&self, dep: Dependency) -> SchedulingResult<()> {
                with_tables($mutex_expr(self), |t| t.dependencies.push(dep));
                Ok(())
            }

            fn requirement_of(&self, task_id: &str) -> SchedulingResult<Requirement> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.requirements
                        .get(task_id)
                        .cloned()
                        .unwrap_or_else(|| Requirement::new(task_id))
                }))
            }

            fn capacity_table(&self) -> SchedulingResult<CapacityTable> {
                Ok(with_tables($mutex_expr(self), |t| t.capacity.clone()))
            }

            fn schedule_of(&self, task_id: &str) -> SchedulingResult<Option<ScheduleRecord>> {
                Ok(with_tables($mutex_expr(self), |t| t.schedules.get(task_id).cloned()))
            }

            fn put_schedule(&self, record: ScheduleRecord) -> SchedulingResult<()> {
                with_tables($mutex_expr(self), |t| {
                    t.schedules.insert(record.task_id.clone(), record);
                });
                Ok(())
            }

            fn all_schedules(&self) -> SchedulingResult<Vec<ScheduleRecord>> {
                Ok(with_tables($mutex_expr(self), |t| t.schedules.values().cloned().collect()))
            }

            fn segments_of(&self, task_id: &str) -> SchedulingResult<Vec<TaskSegment>> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.segments.get(task_id).cloned().unwrap_or_default()
                }))
            }

            fn append_segment(&self, segment: TaskSegment) -> SchedulingResult<()> {
                with_tables($mutex_expr(self), |t| {
                    t.segments.entry(segment.task_id.clone()).or_default().push(segment);
                });
                Ok(())
            }

            fn progress_of(&self, task_id: &str) -> SchedulingResult<Vec<ProgressEntry>> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.progress.get(task_id).cloned().unwrap_or_default()
                }))
            }

            fn append_progress(&self, entry: ProgressEntry) -> SchedulingResult<()> {
                with_tables($mutex_expr(self), |t| {
                    t.progress.entry(entry.task_id.clone()).or_default().push(entry);
                });
                Ok(())
            }

            fn pauses_of(&self, task_id: &str) -> SchedulingResult<Vec<PauseEntry>> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.pauses.get(task_id).cloned().unwrap_or_default()
                }))
            }

            fn append_pause(&self, entry: PauseEntry) -> SchedulingResult<()> {
                with_tables($mutex_expr(self), |t| {
                    t.pauses.entry(entry.task_id.clone()).or_default().push(entry);
                });
                Ok(())
            }

            fn append_change_log(&self, entry: ChangeLogEntry) -> SchedulingResult<()> {
                with_tables($mutex_expr(self), |t| {
                    t.change_log.entry(entry.task_id.clone()).or_default().push(entry);
                });
                Ok(())
            }

            fn change_log_of(&self, task_id: &str) -> SchedulingResult<Vec<ChangeLogEntry>> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.change_log.get(task_id).cloned().unwrap_or_default()
                }))
            }

            fn assignments_of(&self, task_id: &str) -> SchedulingResult<Vec<Assignment>> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.assignments.get(task_id).cloned().unwrap_or_default()
                }))
            }

            fn assignments_for_entity(&self, entity_id: &str) -> SchedulingResult<Vec<Assignment>> {
                Ok(with_tables($mutex_expr(self), |t| {
                    t.assignments
                        .values()
                        .flatten()
                        .filter(|a| a.entity_id == entity_id)
                        .cloned()
                        .collect()
                }))
            }

            fn put_assignment(&self, assignment: Assignment) -> SchedulingResult<()> {
                with_tables($mutex_expr(self), |t| {
                    t.assignments.entry(assignment.task_id.clone()).or_default().push(assignment);
                });
                Ok(())
            }

            fn all_assignments(&self) -> SchedulingResult<Vec<Assignment>> {
                Ok(with_tables($mutex_expr(self), |t| t.assignments.values().flatten().cloned().collect()))
            }

            fn employees(&self) -> SchedulingResult<Vec<PoolEntity>> {
                Ok(with_tables($mutex_expr(self), |t| t.employees.clone()))
            }

            fn equipment(&self) -> SchedulingResult<Vec<PoolEntity>> {
                Ok(with_tables($mutex_expr(self), |t| t.equipment.clone()))
            }
        }
    };
}

fn in_memory_store_mutex(s: &InMemoryStore) -> &Mutex<Tables> {
    &s.tables
}

fn transaction_scope_mutex<'a>(s: &TransactionScope<'a>) -> &'a Mutex<Tables> {
    s.scratch
}

impl_store_for!(InMemoryStore, in_memory_store_mutex);
impl_store_for!(TransactionScope<'_>, transaction_scope_mutex);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use rust_decimal_macros::dec;

    #[test]
    fn seeded_task_is_readable() {
        let store = InMemoryStore::new();
        store.seed_task(Task::new("t1", "Dig trench", dec!(4)).priority(Priority::High));
        let t = store.task("t1").unwrap();
        assert_eq!(t.name, "Dig trench");
    }

    #[test]
    fn missing_task_is_task_not_found() {
        let store = InMemoryStore::new();
        let err = store.task("missing").unwrap_err();
        assert!(matches!(err, SchedulingError::TaskNotFound { .. }));
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = InMemoryStore::new();
        store.seed_task(Task::new("t1", "Dig trench", dec!(4)));

        let result: SchedulingResult<()> = store.transaction(|_scope| {
            Err(SchedulingError::Internal("boom".to_string()))
        });
        assert!(result.is_err());
        // Original task is untouched; no partial writes occurred.
        assert_eq!(store.task("t1").unwrap().name, "Dig trench");
    }

    #[test]
    fn dependencies_filtered_by_direction() {
        let store = InMemoryStore::new();
        store.seed_dependency(Dependency::new("a", "b"));
        assert_eq!(store.dependencies_of("b").unwrap().len(), 1);
        assert_eq!(store.dependents_of("a").unwrap().len(), 1);
        assert_eq!(store.dependencies_of("a").unwrap().len(), 0);
    }
}
