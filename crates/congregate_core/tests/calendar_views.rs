use chrono::{NaiveDate, NaiveTime, Weekday};
use congregate_core::calendar::local_date::{month_grid_dates, week_dates};
use congregate_core::{
    events_by_date, expand, DayAgenda, Event, HourRange, RecurrenceConfig, RecurrenceType,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Root plus its expanded instances, as a client would hold them after a
/// fetch.
fn with_instances(root: Event) -> Vec<Event> {
    let rule = root.recurrence.clone().unwrap();
    let mut events = expand(&root, &rule);
    events.insert(0, root);
    events
}

#[test]
fn week_view_shows_series_and_multi_day_event() {
    let mut events = with_instances(
        Event::new("org-1", "Morning prayer", date(2024, 6, 9))
            .with_times(time(7, 0), time(7, 30))
            .with_recurrence(RecurrenceConfig::new(RecurrenceType::Daily).ending_after(3)),
    );
    events.push(
        Event::new("org-1", "Youth camp", date(2024, 6, 10)).with_end_date(date(2024, 6, 12)),
    );

    let dates = week_dates(date(2024, 6, 12), Weekday::Sun);
    let grouped = events_by_date(&events, &dates);

    assert_eq!(grouped.len(), 7);
    let titles = |day: NaiveDate| -> Vec<&str> {
        grouped[&day].iter().map(|event| event.title.as_str()).collect()
    };
    assert_eq!(titles(date(2024, 6, 9)), vec!["Morning prayer"]);
    assert_eq!(titles(date(2024, 6, 10)), vec!["Morning prayer", "Youth camp"]);
    assert_eq!(titles(date(2024, 6, 12)), vec!["Youth camp"]);
    assert!(titles(date(2024, 6, 13)).is_empty());
}

#[test]
fn month_grid_picks_up_monthly_series_once_per_month() {
    let events = with_instances(
        Event::new("org-1", "Elders meeting", date(2024, 1, 31))
            .with_times(time(19, 0), time(21, 0))
            .with_recurrence(RecurrenceConfig::new(RecurrenceType::Monthly).ending_after(3)),
    );

    let grid = month_grid_dates(date(2024, 2, 15), Weekday::Sun);
    let grouped = events_by_date(&events, &grid);
    let hits: Vec<NaiveDate> = grouped
        .iter()
        .filter(|(_, day_events)| !day_events.is_empty())
        .map(|(day, _)| *day)
        .collect();

    assert_eq!(hits, vec![date(2024, 1, 31), date(2024, 2, 29)]);
}

#[test]
fn day_agenda_lays_out_overlapping_services() {
    let events = vec![
        Event::new("org-1", "Baptism class", date(2024, 6, 16)).with_times(time(9, 0), time(10, 0)),
        Event::new("org-1", "Worship", date(2024, 6, 16)).with_times(time(9, 30), time(11, 0)),
        Event::new("org-1", "Lunch", date(2024, 6, 16)).with_times(time(11, 0), time(12, 0)),
        Event::new("org-1", "Father's day", date(2024, 6, 16)),
    ];

    let agenda = DayAgenda::build(&events, date(2024, 6, 16));

    assert_eq!(agenda.all_day.len(), 1);
    assert_eq!(agenda.timed.len(), 3);
    let by_title = |title: &str| {
        agenda
            .timed
            .iter()
            .find(|positioned| positioned.event.title == title)
            .copied()
            .unwrap()
    };
    assert_eq!(by_title("Baptism class").columns_count, 2);
    assert_eq!(by_title("Worship").column_index, 1);
    assert_eq!(by_title("Lunch").columns_count, 1);

    let range = HourRange {
        start_hour: 8,
        end_hour: 12,
    };
    let slot = by_title("Worship").geometry(&range).unwrap();
    assert_eq!(slot.left, 0.5);
    assert_eq!(slot.top, 0.375);
    assert_eq!(slot.height, 0.375);
}
