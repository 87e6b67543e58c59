//! Overlap layout for one day's timed events.
//!
//! # Responsibility
//! - Cluster overlapping time ranges with first-fit grouping.
//! - Assign each event a column index and the column count of its cluster.
//! - Convert column assignments into slot fractions for a time grid.
//!
//! # Invariants
//! - Overlap is strict: touching ranges (`10:00` end, `10:00` start) do not
//!   overlap.
//! - Every member of a cluster shares one `columns_count`, even when two
//!   members only overlap through a third.
//! - Input order does not affect output: ties on start time are broken by
//!   later end time first, then by id.

use crate::calendar::local_date::minutes_since_midnight;
use crate::model::event::Event;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One event's column assignment for a single rendering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionedEvent<'a> {
    pub event: &'a Event,
    /// 0-based column inside the event's cluster.
    pub column_index: usize,
    /// Number of columns in the event's cluster.
    pub columns_count: usize,
}

/// Rendered hour range of a day grid, `start_hour..end_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourRange {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for HourRange {
    fn default() -> Self {
        Self {
            start_hour: 0,
            end_hour: 24,
        }
    }
}

impl HourRange {
    fn start_minutes(&self) -> u32 {
        self.start_hour * 60
    }

    fn end_minutes(&self) -> u32 {
        self.end_hour * 60
    }

    fn fraction_of(&self, minutes: u32) -> f64 {
        let total = self.end_minutes().saturating_sub(self.start_minutes()).max(1);
        f64::from(minutes.saturating_sub(self.start_minutes())) / f64::from(total)
    }
}

/// Fractional box of an event inside the day grid, all values in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotGeometry {
    pub left: f64,
    pub width: f64,
    pub top: f64,
    pub height: f64,
}

impl PositionedEvent<'_> {
    /// Horizontal slot `[i/n, (i+1)/n)` as `(left, width)`.
    pub fn horizontal_slot(&self) -> (f64, f64) {
        let count = self.columns_count.max(1) as f64;
        (self.column_index as f64 / count, 1.0 / count)
    }

    /// Box of this event clipped to `range`.
    ///
    /// Returns `None` when the event lies entirely outside the range.
    pub fn geometry(&self, range: &HourRange) -> Option<SlotGeometry> {
        let start = minutes_since_midnight(self.event.start_time);
        let end = minutes_since_midnight(self.event.end_time);
        if end <= range.start_minutes() || start >= range.end_minutes() {
            return None;
        }

        let clipped_start = start.max(range.start_minutes());
        let clipped_end = end.min(range.end_minutes());
        let top = range.fraction_of(clipped_start);
        let (left, width) = self.horizontal_slot();

        Some(SlotGeometry {
            left,
            width,
            top,
            height: range.fraction_of(clipped_end) - top,
        })
    }
}

/// Lays out the timed events of one day.
///
/// All-day events must be filtered out by the caller. Output is grouped by
/// cluster, each cluster in column order.
pub fn layout_day<'a>(events: &[&'a Event]) -> Vec<PositionedEvent<'a>> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|left, right| compare_for_layout(left, right));

    let mut clusters: Vec<Vec<&'a Event>> = Vec::new();
    for event in sorted {
        let open = clusters
            .iter_mut()
            .find(|cluster| cluster.iter().any(|member| overlaps(event, member)));
        match open {
            Some(cluster) => cluster.push(event),
            None => clusters.push(vec![event]),
        }
    }

    clusters
        .into_iter()
        .flat_map(|cluster| {
            let columns_count = cluster.len();
            cluster
                .into_iter()
                .enumerate()
                .map(move |(column_index, event)| PositionedEvent {
                    event,
                    column_index,
                    columns_count,
                })
        })
        .collect()
}

/// Position of the now line on `date`, as a fraction of `range`.
///
/// `reference` is the caller's notion of "now"; nothing here reads a clock.
/// Returns `None` when `reference` is on another date or outside the range.
pub fn now_indicator(reference: NaiveDateTime, date: NaiveDate, range: &HourRange) -> Option<f64> {
    if reference.date() != date {
        return None;
    }
    let minutes = minutes_since_midnight(reference.time());
    if minutes < range.start_minutes() || minutes > range.end_minutes() {
        return None;
    }
    Some(range.fraction_of(minutes))
}

fn overlaps(event: &Event, member: &Event) -> bool {
    event.start_time < member.end_time && event.end_time > member.start_time
}

fn compare_for_layout(left: &Event, right: &Event) -> Ordering {
    left.start_time
        .cmp(&right.start_time)
        .then_with(|| right.end_time.cmp(&left.end_time))
        .then_with(|| left.id.cmp(&right.id))
}

#[cfg(test)]
mod tests {
    use super::{layout_day, now_indicator, HourRange, PositionedEvent};
    use crate::model::event::Event;
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn timed(title: &str, start: (u32, u32), end: (u32, u32)) -> Event {
        Event::new("org-1", title, date()).with_times(
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        )
    }

    fn find<'a>(laid_out: &'a [PositionedEvent<'a>], title: &str) -> &'a PositionedEvent<'a> {
        laid_out
            .iter()
            .find(|positioned| positioned.event.title == title)
            .unwrap()
    }

    #[test]
    fn touching_events_get_separate_single_columns() {
        let a = timed("A", (9, 0), (10, 0));
        let b = timed("B", (10, 0), (11, 0));

        let laid_out = layout_day(&[&a, &b]);

        assert_eq!(find(&laid_out, "A").columns_count, 1);
        assert_eq!(find(&laid_out, "B").columns_count, 1);
        assert_eq!(find(&laid_out, "B").column_index, 0);
    }

    #[test]
    fn overlapping_events_share_a_cluster() {
        let a = timed("A", (9, 0), (10, 0));
        let b = timed("B", (9, 30), (10, 30));

        let laid_out = layout_day(&[&b, &a]);

        let a_pos = find(&laid_out, "A");
        let b_pos = find(&laid_out, "B");
        assert_eq!((a_pos.column_index, a_pos.columns_count), (0, 2));
        assert_eq!((b_pos.column_index, b_pos.columns_count), (1, 2));
    }

    #[test]
    fn transitive_overlap_widens_the_whole_cluster() {
        let a = timed("A", (9, 0), (10, 0));
        let b = timed("B", (9, 30), (11, 0));
        let c = timed("C", (10, 30), (11, 30));

        let laid_out = layout_day(&[&a, &b, &c]);

        assert!(laid_out.iter().all(|positioned| positioned.columns_count == 3));
        assert_eq!(find(&laid_out, "C").column_index, 2);
    }

    #[test]
    fn equal_start_times_put_longer_event_first() {
        let short = timed("Short", (9, 0), (9, 30));
        let long = timed("Long", (9, 0), (11, 0));

        let laid_out = layout_day(&[&short, &long]);

        assert_eq!(find(&laid_out, "Long").column_index, 0);
        assert_eq!(find(&laid_out, "Short").column_index, 1);
    }

    #[test]
    fn geometry_is_clipped_to_hour_range() {
        let early = timed("Early", (6, 0), (9, 0));
        let late = timed("Late", (21, 0), (23, 0));
        let range = HourRange {
            start_hour: 8,
            end_hour: 20,
        };

        let laid_out = layout_day(&[&early, &late]);

        let geometry = find(&laid_out, "Early").geometry(&range).unwrap();
        assert_eq!(geometry.top, 0.0);
        assert!((geometry.height - 1.0 / 12.0).abs() < 1e-9);
        assert_eq!((geometry.left, geometry.width), (0.0, 1.0));
        assert!(find(&laid_out, "Late").geometry(&range).is_none());
    }

    #[test]
    fn horizontal_slot_splits_day_width() {
        let a = timed("A", (9, 0), (10, 0));
        let b = timed("B", (9, 0), (10, 0));

        let laid_out = layout_day(&[&a, &b]);

        let slots: Vec<_> = laid_out.iter().map(PositionedEvent::horizontal_slot).collect();
        assert_eq!(slots, vec![(0.0, 0.5), (0.5, 0.5)]);
    }

    #[test]
    fn now_indicator_uses_reference_instant() {
        let range = HourRange::default();
        let noon = date().and_hms_opt(12, 0, 0).unwrap();

        assert_eq!(now_indicator(noon, date(), &range), Some(0.5));
        assert_eq!(now_indicator(noon, date().succ_opt().unwrap(), &range), None);
    }

    #[test]
    fn empty_day_lays_out_nothing() {
        assert!(layout_day(&[]).is_empty());
    }
}
