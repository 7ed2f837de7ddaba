//! JSON shape for the `event` subcommand's input record (§6), deserialized
//! into `rso_reschedule::Event`. Kept separate from `rso_reschedule::event`
//! itself so the library crate never takes a `serde` dependency just to
//! satisfy this harness's file format.

use anyhow::Context;
use rso_reschedule::{Event, EventKind};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EventKindRecord {
    ClockIn,
    ClockOut {
        period_start: i64,
        #[serde(default)]
        carry_over: bool,
    },
    Pause {
        start_time: i64,
        end_time: i64,
        reason: String,
    },
    OnHold {
        reason: String,
        #[serde(default)]
        expected_resume: Option<i64>,
    },
    Resume,
    Complete,
    Skip {
        reason: String,
    },
    ManualReschedule {
        new_start: i64,
        new_end: i64,
        reason: String,
    },
    ResourceConflict {
        entity_id: String,
        conflict_time: i64,
    },
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    task_id: String,
    timestamp: i64,
    #[serde(flatten)]
    kind: EventKindRecord,
}

pub fn load_event(path: &Path) -> anyhow::Result<Event> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event file '{}'", path.display()))?;
    let record: EventRecord = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse '{}' as an event record", path.display()))?;
    Ok(to_event(record))
}

fn to_event(record: EventRecord) -> Event {
    let kind = match record.kind {
        EventKindRecord::ClockIn => EventKind::ClockIn,
        EventKindRecord::ClockOut { period_start, carry_over } => {
            EventKind::ClockOut { period_start, carry_over }
        }
        EventKindRecord::Pause { start_time, end_time, reason } => {
            EventKind::Pause { start_time, end_time, reason }
        }
        EventKindRecord::OnHold { reason, expected_resume } => {
            EventKind::OnHold { reason, expected_resume }
        }
        EventKindRecord::Resume => EventKind::Resume,
        EventKindRecord::Complete => EventKind::Complete,
        EventKindRecord::Skip { reason } => EventKind::Skip { reason },
        EventKindRecord::ManualReschedule { new_start, new_end, reason } => {
            EventKind::ManualReschedule { new_start, new_end, reason }
        }
        EventKindRecord::ResourceConflict { entity_id, conflict_time } => {
            EventKind::ResourceConflict { entity_id, conflict_time }
        }
    };
    Event::new(record.task_id, record.timestamp, kind)
}
