//! `schedule` command output: a text table or a JSON document, mirroring
//! the teacher's `format_text`/`format_json_with_diagnostics` split in
//! `utf8proj-cli/src/main.rs`, scaled to this engine's schedule shape
//! (WTU spans resolved to datetimes, plus bound resources per task).

use rso_core::{CalendarConfig, Store};
use serde_json::json;

pub fn format_text(store: &impl Store, calendar: &CalendarConfig) -> rso_core::SchedulingResult<String> {
    let tasks: std::collections::HashMap<_, _> =
        store.tasks()?.into_iter().map(|t| (t.id.clone(), t)).collect();
    let mut schedules = store.all_schedules()?;
    schedules.sort_by_key(|s| s.planned_start);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<30} {:<19} {:<19} {:<12} {}\n",
        "Task", "Start", "Finish", "Status", "Resources"
    ));
    out.push_str(&"-".repeat(100));
    out.push('\n');

    for sched in &schedules {
        let name = tasks
            .get(&sched.task_id)
            .map(|t| t.name.as_str())
            .unwrap_or(&sched.task_id);
        let start = calendar.wtu_to_datetime(sched.planned_start);
        let end = calendar.wtu_to_datetime(sched.planned_end);
        let resources: Vec<String> = store
            .assignments_of(&sched.task_id)?
            .into_iter()
            .map(|a| a.entity_id)
            .collect();
        out.push_str(&format!(
            "{:<30} {:<19} {:<19} {:<12} {}\n",
            truncate(name, 30),
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M"),
            sched.status.to_string(),
            resources.join(", "),
        ));
    }
    Ok(out)
}

pub fn format_json(store: &impl Store, calendar: &CalendarConfig) -> rso_core::SchedulingResult<String> {
    let tasks: std::collections::HashMap<_, _> =
        store.tasks()?.into_iter().map(|t| (t.id.clone(), t)).collect();
    let mut schedules = store.all_schedules()?;
    schedules.sort_by_key(|s| s.planned_start);

    let mut rows = Vec::with_capacity(schedules.len());
    for sched in &schedules {
        let name = tasks
            .get(&sched.task_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| sched.task_id.clone());
        let start = calendar.wtu_to_datetime(sched.planned_start);
        let end = calendar.wtu_to_datetime(sched.planned_end);
        let resources: Vec<String> = store
            .assignments_of(&sched.task_id)?
            .into_iter()
            .map(|a| a.entity_id)
            .collect();
        rows.push(json!({
            "task_id": sched.task_id,
            "name": name,
            "start": start.to_string(),
            "finish": end.to_string(),
            "status": sched.status.to_string(),
            "resources": resources,
        }));
    }

    Ok(serde_json::to_string_pretty(&json!({ "tasks": rows })).expect("json is always valid utf8"))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}
