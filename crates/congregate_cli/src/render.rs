use chrono::{NaiveDate, NaiveDateTime};
use congregate_core::{format_local_date, now_indicator, DayAgenda, Event, HourRange};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub fn agenda(agenda: &DayAgenda<'_>, range: &HourRange, now: Option<NaiveDateTime>) -> Value {
    let timed: Vec<Value> = agenda
        .timed
        .iter()
        .map(|positioned| {
            let geometry = positioned.geometry(range).map(|slot| {
                json!({
                    "left": slot.left,
                    "width": slot.width,
                    "top": slot.top,
                    "height": slot.height,
                })
            });
            json!({
                "event": positioned.event,
                "columnIndex": positioned.column_index,
                "columnsCount": positioned.columns_count,
                "slot": geometry,
            })
        })
        .collect();

    json!({
        "date": format_local_date(agenda.date),
        "allDay": agenda.all_day,
        "timed": timed,
        "nowLine": now.and_then(|reference| now_indicator(reference, agenda.date, range)),
    })
}

pub fn by_date(grouped: &BTreeMap<NaiveDate, Vec<&Event>>) -> Value {
    let days: Vec<Value> = grouped
        .iter()
        .map(|(date, events)| {
            json!({
                "date": format_local_date(*date),
                "events": events,
            })
        })
        .collect();
    Value::Array(days)
}
