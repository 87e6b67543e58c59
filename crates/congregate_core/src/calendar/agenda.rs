//! One day's view model: window selection plus timed layout.

use crate::calendar::layout::{layout_day, PositionedEvent};
use crate::calendar::window::occurs_on;
use crate::model::event::Event;
use chrono::NaiveDate;

/// Events displayed on one date, split into the all-day ribbon and the
/// laid-out time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAgenda<'a> {
    pub date: NaiveDate,
    /// All-day events, ordered by title then id.
    pub all_day: Vec<&'a Event>,
    pub timed: Vec<PositionedEvent<'a>>,
}

impl<'a> DayAgenda<'a> {
    /// Builds the agenda for `date` from an unordered event collection.
    pub fn build(events: &'a [Event], date: NaiveDate) -> Self {
        let (mut all_day, timed): (Vec<&Event>, Vec<&Event>) = events
            .iter()
            .filter(|event| occurs_on(event, date))
            .partition(|event| event.is_all_day);

        all_day.sort_by(|left, right| left.title.cmp(&right.title).then(left.id.cmp(&right.id)));

        Self {
            date,
            all_day,
            timed: layout_day(&timed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_day.is_empty() && self.timed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::DayAgenda;
    use crate::model::event::Event;
    use chrono::{NaiveDate, NaiveTime};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn build_splits_all_day_from_timed() {
        let events = vec![
            Event::new("org-1", "VBS week", date(9)).with_end_date(date(14)),
            Event::new("org-1", "Choir", date(10)).with_times(time(18), time(19)),
            Event::new("org-1", "Elders", date(10)).with_times(time(18), time(20)),
            Event::new("org-1", "Tomorrow", date(11)).with_times(time(9), time(10)),
        ];

        let agenda = DayAgenda::build(&events, date(10));

        assert_eq!(agenda.all_day.len(), 1);
        assert_eq!(agenda.all_day[0].title, "VBS week");
        assert_eq!(agenda.timed.len(), 2);
        assert!(agenda.timed.iter().all(|positioned| positioned.columns_count == 2));
        assert_eq!(agenda.timed[0].event.title, "Elders");
    }

    #[test]
    fn empty_day_has_nothing() {
        let events = vec![Event::new("org-1", "Potluck", date(10))];
        assert!(DayAgenda::build(&events, date(12)).is_empty());
    }
}
