//! Event store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the outbound persistence effects the series controller relies on.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Event::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Every call either fully succeeds or returns an error; multi-row inserts
//!   run inside one transaction.

use crate::calendar::local_date::{
    format_local_date, format_time_hhmm, parse_local_date, parse_time_hhmm,
};
use crate::db::DbError;
use crate::model::event::{Event, EventId, EventValidationError};
use crate::model::recurrence::RecurrenceConfig;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use thiserror::Error;
use uuid::Uuid;

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    organization_id,
    title,
    description,
    location,
    visibility,
    color,
    group_ids,
    date,
    end_date,
    start_time,
    end_time,
    is_all_day,
    recurrence,
    parent_event_id
FROM events";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for event persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] EventValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("event not found: {0}")]
    NotFound(EventId),
    #[error("invalid persisted event data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Selector for `EventRepository::delete_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// Exactly these records.
    Ids(Vec<EventId>),
    /// Every generated instance of the given root; the root itself survives.
    ChildrenOf(EventId),
}

/// Query options for listing events.
#[derive(Debug, Clone, Default)]
pub struct EventListQuery {
    pub organization_id: Option<String>,
    pub parent_event_id: Option<EventId>,
    /// Keep events whose display window ends on or after this date.
    pub from: Option<NaiveDate>,
    /// Keep events whose display window starts on or before this date.
    pub to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Persistence effects consumed by the series controller.
pub trait EventRepository {
    /// Inserts all events or none. Returns ids in input order.
    fn insert_events(&self, events: &[Event]) -> RepoResult<Vec<EventId>>;
    /// Replaces one stored record with `event`.
    fn update_event(&self, event: &Event) -> RepoResult<()>;
    /// Deletes the selected records. Returns the number removed.
    fn delete_events(&self, target: &DeleteTarget) -> RepoResult<usize>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>>;
}

impl<R: EventRepository + ?Sized> EventRepository for &R {
    fn insert_events(&self, events: &[Event]) -> RepoResult<Vec<EventId>> {
        (**self).insert_events(events)
    }

    fn update_event(&self, event: &Event) -> RepoResult<()> {
        (**self).update_event(event)
    }

    fn delete_events(&self, target: &DeleteTarget) -> RepoResult<usize> {
        (**self).delete_events(target)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        (**self).get_event(id)
    }

    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>> {
        (**self).list_events(query)
    }
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn insert_events(&self, events: &[Event]) -> RepoResult<Vec<EventId>> {
        for event in events {
            event.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO events (
                    id,
                    organization_id,
                    title,
                    description,
                    location,
                    visibility,
                    color,
                    group_ids,
                    date,
                    end_date,
                    start_time,
                    end_time,
                    is_all_day,
                    recurrence,
                    parent_event_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
            )?;

            for event in events {
                stmt.execute(params![
                    event.id.to_string(),
                    event.organization_id.as_str(),
                    event.title.as_str(),
                    event.description.as_deref(),
                    event.location.as_deref(),
                    event.visibility.as_deref(),
                    event.color.as_deref(),
                    group_ids_to_db(&event.group_ids)?,
                    format_local_date(event.date),
                    event.end_date.map(format_local_date),
                    format_time_hhmm(event.start_time),
                    format_time_hhmm(event.end_time),
                    bool_to_int(event.is_all_day),
                    recurrence_to_db(event.recurrence.as_ref())?,
                    event.parent_event_id.map(|id| id.to_string()),
                ])?;
            }
        }
        tx.commit()?;

        Ok(events.iter().map(|event| event.id).collect())
    }

    fn update_event(&self, event: &Event) -> RepoResult<()> {
        event.validate()?;

        let changed = self.conn.execute(
            "UPDATE events
             SET
                organization_id = ?1,
                title = ?2,
                description = ?3,
                location = ?4,
                visibility = ?5,
                color = ?6,
                group_ids = ?7,
                date = ?8,
                end_date = ?9,
                start_time = ?10,
                end_time = ?11,
                is_all_day = ?12,
                recurrence = ?13,
                parent_event_id = ?14,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?15;",
            params![
                event.organization_id.as_str(),
                event.title.as_str(),
                event.description.as_deref(),
                event.location.as_deref(),
                event.visibility.as_deref(),
                event.color.as_deref(),
                group_ids_to_db(&event.group_ids)?,
                format_local_date(event.date),
                event.end_date.map(format_local_date),
                format_time_hhmm(event.start_time),
                format_time_hhmm(event.end_time),
                bool_to_int(event.is_all_day),
                recurrence_to_db(event.recurrence.as_ref())?,
                event.parent_event_id.map(|id| id.to_string()),
                event.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(event.id));
        }

        Ok(())
    }

    fn delete_events(&self, target: &DeleteTarget) -> RepoResult<usize> {
        let removed = match target {
            DeleteTarget::Ids(ids) if ids.is_empty() => 0,
            DeleteTarget::Ids(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                self.conn.execute(
                    &format!("DELETE FROM events WHERE id IN ({placeholders});"),
                    params_from_iter(ids.iter().map(|id| id.to_string())),
                )?
            }
            DeleteTarget::ChildrenOf(root_id) => self.conn.execute(
                "DELETE FROM events WHERE parent_event_id = ?1;",
                [root_id.to_string()],
            )?,
        };

        Ok(removed)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }

        Ok(None)
    }

    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>> {
        let mut sql = format!("{EVENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(organization_id) = &query.organization_id {
            sql.push_str(" AND organization_id = ?");
            bind_values.push(Value::Text(organization_id.clone()));
        }

        if let Some(parent_event_id) = query.parent_event_id {
            sql.push_str(" AND parent_event_id = ?");
            bind_values.push(Value::Text(parent_event_id.to_string()));
        }

        // ISO dates compare correctly as text.
        if let Some(from) = query.from {
            sql.push_str(" AND COALESCE(end_date, date) >= ?");
            bind_values.push(Value::Text(format_local_date(from)));
        }

        if let Some(to) = query.to {
            sql.push_str(" AND date <= ?");
            bind_values.push(Value::Text(format_local_date(to)));
        }

        sql.push_str(" ORDER BY date ASC, start_time ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();

        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }

        Ok(events)
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let id = parse_uuid(&row.get::<_, String>("id")?, "events.id")?;
    let parent_event_id = match row.get::<_, Option<String>>("parent_event_id")? {
        Some(value) => Some(parse_uuid(&value, "events.parent_event_id")?),
        None => None,
    };

    let end_date = match row.get::<_, Option<String>>("end_date")? {
        Some(value) => Some(parse_date_column(&value, "events.end_date")?),
        None => None,
    };

    let group_ids_text: String = row.get("group_ids")?;
    let group_ids = serde_json::from_str::<Vec<String>>(&group_ids_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid group ids `{group_ids_text}`: {err}"))
    })?;

    let recurrence = match row.get::<_, Option<String>>("recurrence")? {
        Some(value) => Some(
            serde_json::from_str::<RecurrenceConfig>(&value).map_err(|err| {
                RepoError::InvalidData(format!("invalid recurrence `{value}`: {err}"))
            })?,
        ),
        None => None,
    };

    let is_all_day = match row.get::<_, i64>("is_all_day")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_all_day value `{other}` in events.is_all_day"
            )));
        }
    };

    let event = Event {
        id,
        organization_id: row.get("organization_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        location: row.get("location")?,
        visibility: row.get("visibility")?,
        color: row.get("color")?,
        group_ids,
        date: parse_date_column(&row.get::<_, String>("date")?, "events.date")?,
        end_date,
        start_time: parse_time_column(&row.get::<_, String>("start_time")?, "events.start_time")?,
        end_time: parse_time_column(&row.get::<_, String>("end_time")?, "events.end_time")?,
        is_all_day,
        recurrence,
        parent_event_id,
    };
    event.validate()?;
    Ok(event)
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_date_column(value: &str, column: &str) -> RepoResult<NaiveDate> {
    parse_local_date(value).map_err(|err| RepoError::InvalidData(format!("{err} in {column}")))
}

fn parse_time_column(value: &str, column: &str) -> RepoResult<NaiveTime> {
    parse_time_hhmm(value).map_err(|err| RepoError::InvalidData(format!("{err} in {column}")))
}

fn group_ids_to_db(group_ids: &[String]) -> RepoResult<String> {
    serde_json::to_string(group_ids)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode group ids: {err}")))
}

fn recurrence_to_db(recurrence: Option<&RecurrenceConfig>) -> RepoResult<Option<String>> {
    recurrence
        .map(serde_json::to_string)
        .transpose()
        .map_err(|err| RepoError::InvalidData(format!("cannot encode recurrence: {err}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
