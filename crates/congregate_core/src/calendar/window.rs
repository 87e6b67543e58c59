//! Multi-day display window resolution.
//!
//! Independent of recurrence: each generated instance carries its own window.

use crate::model::event::Event;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Returns whether `event` is displayed on `date`.
///
/// True on `event.date`, and on every day of the inclusive
/// `[date, end_date]` window when `end_date` is set.
pub fn occurs_on(event: &Event, date: NaiveDate) -> bool {
    if date == event.date {
        return true;
    }
    event
        .end_date
        .is_some_and(|end_date| event.date <= date && date <= end_date)
}

/// Selects the events displayed on `date`, keeping input order.
pub fn events_on(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    events.iter().filter(|event| occurs_on(event, date)).collect()
}

/// Groups events by each visible date of a week or month view.
///
/// Every requested date gets an entry, empty when nothing occurs on it.
pub fn events_by_date<'a>(
    events: &'a [Event],
    dates: &[NaiveDate],
) -> BTreeMap<NaiveDate, Vec<&'a Event>> {
    dates
        .iter()
        .map(|date| (*date, events_on(events, *date)))
        .collect()
}
