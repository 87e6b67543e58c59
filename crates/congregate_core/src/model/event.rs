//! Event domain model.
//!
//! # Responsibility
//! - Define the canonical schedulable record shared by roots and instances.
//! - Provide partial-update (`EventPatch`) semantics used by series mutation.
//!
//! # Invariants
//! - `id` is stable and never reused for another event.
//! - `end_date`, when set, is never earlier than `date`.
//! - All-day events always carry `00:00`/`23:59` as their times.
//! - An event with `parent_event_id` never carries a `recurrence`.

use crate::calendar::local_date::{ALL_DAY_END, ALL_DAY_START};
use crate::model::recurrence::RecurrenceConfig;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier for every event record.
pub type EventId = Uuid;

/// One schedulable calendar record.
///
/// Serialized with camelCase keys, `YYYY-MM-DD` dates and `HH:MM` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Generated when absent, so authored roots may omit it.
    #[serde(default = "Uuid::new_v4")]
    pub id: EventId,
    /// Opaque owner scope of the flat event collection.
    pub organization_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Associated groups or ministries, opaque to scheduling.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_ids: Vec<String>,
    pub date: NaiveDate,
    /// Inclusive last day of a multi-day display window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// `00:00` when absent; forced to `00:00` for all-day events.
    #[serde(with = "hhmm", default = "all_day_start")]
    pub start_time: NaiveTime,
    /// `23:59` when absent; forced to `23:59` for all-day events.
    #[serde(with = "hhmm", default = "all_day_end")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub is_all_day: bool,
    /// Present only on a root that generates a series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceConfig>,
    /// Present only on a generated instance, pointing at its root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<EventId>,
}

/// Validation errors for event invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventValidationError {
    #[error("event id must not be nil")]
    NilId,
    #[error("event title must not be blank")]
    BlankTitle,
    #[error("end date {end_date} is before start date {date}")]
    ReversedWindow {
        date: NaiveDate,
        end_date: NaiveDate,
    },
    #[error("end time {end} is before start time {start}")]
    ReversedTimes { start: NaiveTime, end: NaiveTime },
    #[error("all-day event times must be 00:00-23:59")]
    UnnormalizedAllDayTimes,
    #[error("generated instance must not carry a recurrence rule")]
    ChildWithRecurrence,
    #[error("event cannot be its own parent: {0}")]
    SelfParent(EventId),
}

impl Event {
    /// Creates an all-day event with a generated stable ID.
    pub fn new(
        organization_id: impl Into<String>,
        title: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id: organization_id.into(),
            title: title.into(),
            description: None,
            location: None,
            visibility: None,
            color: None,
            group_ids: Vec::new(),
            date,
            end_date: None,
            start_time: ALL_DAY_START,
            end_time: ALL_DAY_END,
            is_all_day: true,
            recurrence: None,
            parent_event_id: None,
        }
    }

    /// Turns this event into a timed event spanning `start..end`.
    pub fn with_times(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.is_all_day = false;
        self.start_time = start;
        self.end_time = end;
        self
    }

    /// Sets the inclusive last day of the display window.
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Attaches a recurrence rule, making this event a series root.
    pub fn with_recurrence(mut self, recurrence: RecurrenceConfig) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Returns whether this event owns a rule that generates instances.
    pub fn is_recurring_root(&self) -> bool {
        self.parent_event_id.is_none()
            && self
                .recurrence
                .as_ref()
                .is_some_and(RecurrenceConfig::is_recurring)
    }

    /// Number of extra days covered by the display window.
    pub fn window_span_days(&self) -> i64 {
        self.end_date
            .map_or(0, |end_date| (end_date - self.date).num_days())
    }

    /// Forces `00:00`/`23:59` times on all-day events.
    pub fn normalize_all_day_times(&mut self) {
        if self.is_all_day {
            self.start_time = ALL_DAY_START;
            self.end_time = ALL_DAY_END;
        }
    }

    /// Validates event invariants.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.id.is_nil() {
            return Err(EventValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(EventValidationError::BlankTitle);
        }
        if let Some(end_date) = self.end_date {
            if end_date < self.date {
                return Err(EventValidationError::ReversedWindow {
                    date: self.date,
                    end_date,
                });
            }
        }
        if self.is_all_day {
            if self.start_time != ALL_DAY_START || self.end_time != ALL_DAY_END {
                return Err(EventValidationError::UnnormalizedAllDayTimes);
            }
        } else if self.end_time < self.start_time {
            return Err(EventValidationError::ReversedTimes {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if let Some(parent_id) = self.parent_event_id {
            if parent_id == self.id {
                return Err(EventValidationError::SelfParent(parent_id));
            }
            if self.recurrence.is_some() {
                return Err(EventValidationError::ChildWithRecurrence);
            }
        }
        Ok(())
    }
}

/// Partial update applied by single or series mutations.
///
/// `None` leaves a field untouched. Nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub visibility: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub group_ids: Option<Vec<String>>,
    pub date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_all_day: Option<bool>,
    pub recurrence: Option<RecurrenceConfig>,
}

impl EventPatch {
    /// Returns whether the patch carries a rule.
    pub fn has_recurrence(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Returns a copy of this patch with the rule removed.
    pub fn without_recurrence(&self) -> Self {
        Self {
            recurrence: None,
            ..self.clone()
        }
    }

    /// Applies every non-recurrence field to `event`.
    pub fn apply_to(&self, event: &mut Event) {
        self.apply_shared(event);
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(end_date) = self.end_date {
            event.end_date = end_date;
        }
        event.normalize_all_day_times();
    }

    /// Applies the fields shared uniformly across a series.
    ///
    /// `date` and `end_date` are left alone: every series member keeps its
    /// own occurrence date.
    pub fn apply_shared(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(visibility) = &self.visibility {
            event.visibility = visibility.clone();
        }
        if let Some(color) = &self.color {
            event.color = color.clone();
        }
        if let Some(group_ids) = &self.group_ids {
            event.group_ids = group_ids.clone();
        }
        if let Some(is_all_day) = self.is_all_day {
            event.is_all_day = is_all_day;
        }
        if let Some(start_time) = self.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            event.end_time = end_time;
        }
        event.normalize_all_day_times();
    }
}

fn all_day_start() -> NaiveTime {
    ALL_DAY_START
}

fn all_day_end() -> NaiveTime {
    ALL_DAY_END
}

/// Serde adapter for `HH:MM` time strings.
mod hhmm {
    use crate::calendar::local_date::{format_time_hhmm, parse_time_hhmm};
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_time_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_time_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventPatch, EventValidationError};
    use crate::model::recurrence::{RecurrenceConfig, RecurrenceType};
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn new_event_is_normalized_all_day() {
        let event = Event::new("org-1", "Potluck", date(2024, 6, 10));
        assert!(event.is_all_day);
        assert_eq!(event.start_time, time(0, 0));
        assert_eq!(event.end_time, time(23, 59));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn validate_rejects_reversed_window() {
        let event = Event::new("org-1", "Retreat", date(2024, 6, 10)).with_end_date(date(2024, 6, 9));
        assert!(matches!(
            event.validate(),
            Err(EventValidationError::ReversedWindow { .. })
        ));
    }

    #[test]
    fn validate_rejects_child_with_recurrence() {
        let mut event = Event::new("org-1", "Choir", date(2024, 6, 10))
            .with_recurrence(RecurrenceConfig::new(RecurrenceType::Weekly));
        event.parent_event_id = Some(Uuid::new_v4());
        assert_eq!(
            event.validate(),
            Err(EventValidationError::ChildWithRecurrence)
        );
    }

    #[test]
    fn validate_rejects_reversed_times() {
        let event = Event::new("org-1", "Choir", date(2024, 6, 10)).with_times(time(11, 0), time(10, 0));
        assert!(matches!(
            event.validate(),
            Err(EventValidationError::ReversedTimes { .. })
        ));
    }

    #[test]
    fn apply_shared_keeps_dates_and_normalizes_all_day() {
        let mut event =
            Event::new("org-1", "Choir", date(2024, 6, 10)).with_times(time(18, 0), time(19, 30));
        let patch = EventPatch {
            title: Some("Choir practice".to_string()),
            date: Some(date(2024, 7, 1)),
            is_all_day: Some(true),
            ..EventPatch::default()
        };

        patch.apply_shared(&mut event);

        assert_eq!(event.title, "Choir practice");
        assert_eq!(event.date, date(2024, 6, 10));
        assert!(event.is_all_day);
        assert_eq!(event.start_time, time(0, 0));
        assert_eq!(event.end_time, time(23, 59));
    }

    #[test]
    fn apply_to_can_clear_nullable_fields() {
        let mut event = Event::new("org-1", "Retreat", date(2024, 6, 10)).with_end_date(date(2024, 6, 12));
        event.location = Some("Camp".to_string());
        let patch = EventPatch {
            location: Some(None),
            end_date: Some(None),
            ..EventPatch::default()
        };

        patch.apply_to(&mut event);

        assert_eq!(event.location, None);
        assert_eq!(event.end_date, None);
    }

    #[test]
    fn serialization_uses_expected_wire_fields() {
        let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        let mut event =
            Event::new("org-1", "Bible study", date(2024, 1, 7)).with_times(time(9, 0), time(10, 30));
        event.id = id;

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["organizationId"], "org-1");
        assert_eq!(json["date"], "2024-01-07");
        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["endTime"], "10:30");
        assert_eq!(json["isAllDay"], false);
        assert!(json.get("recurrence").is_none());
        assert!(json.get("parentEventId").is_none());

        let decoded: Event = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn all_day_wire_event_may_omit_id_and_times() {
        let decoded: Event = serde_json::from_str(
            r#"{"organizationId":"org-1","title":"Harvest festival","date":"2024-09-21","isAllDay":true}"#,
        )
        .unwrap();

        assert!(!decoded.id.is_nil());
        assert_eq!(decoded.start_time, time(0, 0));
        assert_eq!(decoded.end_time, time(23, 59));
        assert_eq!(decoded.validate(), Ok(()));
    }

    #[test]
    fn all_day_wire_times_are_ignored_after_normalizing() {
        let mut decoded: Event = serde_json::from_str(
            r#"{"organizationId":"org-1","title":"Harvest festival","date":"2024-09-21",
                "isAllDay":true,"startTime":"10:00","endTime":"11:00"}"#,
        )
        .unwrap();
        assert_eq!(
            decoded.validate(),
            Err(EventValidationError::UnnormalizedAllDayTimes)
        );

        decoded.normalize_all_day_times();

        assert_eq!((decoded.start_time, decoded.end_time), (time(0, 0), time(23, 59)));
        assert_eq!(decoded.validate(), Ok(()));
    }
}
