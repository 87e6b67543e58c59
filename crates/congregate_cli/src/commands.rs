use crate::render;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use congregate_core::calendar::local_date::week_dates;
use congregate_core::db::open_db;
use congregate_core::{
    events_by_date, expand_with_limits, parse_local_date, CoreConfig, DayAgenda, Event,
    EventListQuery, EventRepository, MutationScope, SeriesService, SqliteEventRepository,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use uuid::Uuid;

pub fn expand(config: &CoreConfig, path: &Path) -> Result<()> {
    let base = read_event(path)?;
    base.validate()?;

    let instances = match &base.recurrence {
        Some(rule) => {
            rule.validate(base.date)?;
            expand_with_limits(&base, rule, &config.expansion)
        }
        None => Vec::new(),
    };

    print_json(&instances)
}

pub fn day(
    config: &CoreConfig,
    path: &Path,
    date: &str,
    now: Option<&str>,
) -> Result<()> {
    let events = read_events(path)?;
    let date = parse_local_date(date)?;
    let now = now
        .map(|value| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
                .with_context(|| format!("invalid --now `{value}`, expected YYYY-MM-DDTHH:MM"))
        })
        .transpose()?;

    let agenda = DayAgenda::build(&events, date);
    print_json(&render::agenda(&agenda, &config.day_view, now))
}

pub fn week(config: &CoreConfig, path: &Path, date: &str) -> Result<()> {
    let events = read_events(path)?;
    let date = parse_local_date(date)?;

    let dates = week_dates(date, config.week_starts_on);
    let grouped = events_by_date(&events, &dates);
    print_json(&render::by_date(&grouped))
}

pub fn create(config: &CoreConfig, db: &Path, path: &Path) -> Result<()> {
    let event = read_event(path)?;
    let conn = open_db(db)?;
    let service = SeriesService::with_limits(SqliteEventRepository::new(&conn), config.expansion);

    let created = service.create_event(event)?;
    print_json(&json!({
        "rootId": created.root_id,
        "childIds": created.child_ids,
    }))
}

pub fn delete(db: &Path, id: &str, series: bool) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("invalid event id `{id}`"))?;
    let conn = open_db(db)?;
    let service = SeriesService::new(SqliteEventRepository::new(&conn));

    let scope = if series {
        MutationScope::Series
    } else {
        MutationScope::Occurrence
    };
    let removed = service.delete(id, scope)?;
    print_json(&json!({ "removed": removed }))
}

pub fn list(db: &Path, date: Option<&str>, org: Option<String>) -> Result<()> {
    let date = date.map(parse_local_date).transpose()?;
    let conn = open_db(db)?;
    let repo = SqliteEventRepository::new(&conn);

    let events = repo.list_events(&EventListQuery {
        organization_id: org,
        from: date,
        to: date,
        ..EventListQuery::default()
    })?;
    print_json(&events)
}

fn read_event(path: &Path) -> Result<Event> {
    let mut event: Event = read_json(path)?;
    event.normalize_all_day_times();
    Ok(event)
}

fn read_events(path: &Path) -> Result<Vec<Event>> {
    let mut events: Vec<Event> = read_json(path)?;
    events.iter_mut().for_each(Event::normalize_all_day_times);
    Ok(events)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_event, read_events};
    use chrono::NaiveTime;
    use std::path::PathBuf;

    fn write_temp(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn all_day_input_times_are_normalized_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "event.json",
            r#"{"organizationId":"org-1","title":"Harvest festival","date":"2024-09-21",
                "isAllDay":true,"startTime":"10:00","endTime":"11:00",
                "recurrence":{"type":"yearly","interval":1,"endType":"after","endAfterOccurrences":3}}"#,
        );

        let event = read_event(&path).unwrap();

        assert_eq!(event.start_time, NaiveTime::MIN);
        assert_eq!(event.validate(), Ok(()));
    }

    #[test]
    fn event_lists_accept_all_day_entries_without_times() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "events.json",
            r#"[{"organizationId":"org-1","title":"Retreat","date":"2024-06-10","endDate":"2024-06-12","isAllDay":true},
                {"organizationId":"org-1","title":"Choir","date":"2024-06-11","startTime":"19:00","endTime":"20:30"}]"#,
        );

        let events = read_events(&path).unwrap();

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.validate().is_ok()));
    }
}
