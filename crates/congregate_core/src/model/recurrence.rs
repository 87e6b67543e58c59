//! Recurrence rule attached to a root event.
//!
//! # Responsibility
//! - Define the wire shape of a recurrence rule.
//! - Provide caller-side validation before any expansion runs.
//!
//! # Invariants
//! - Only a root event carries a rule; generated instances never do.
//! - `RecurrenceType::Weekday` always steps weekly with an interval of 1.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Repetition unit of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    /// Rule is present but generates nothing.
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Every week, pinned to the weekday of the base date.
    Weekday,
}

/// How a rule terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndType {
    /// No natural end; expansion is capped by a horizon.
    Never,
    /// Stop after a total occurrence count, base occurrence included.
    After,
    /// Stop after an inclusive calendar date.
    On,
}

/// Recurrence rule in its boundary representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceConfig {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    /// Step multiplier. Ignored for `RecurrenceType::Weekday`.
    pub interval: u32,
    pub end_type: EndType,
    /// Total instance count including the base occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_after_occurrences: Option<u32>,
    /// Inclusive last date on which an instance may fall.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_on_date: Option<NaiveDate>,
    /// Weekday hint from the authoring form, 0 = Sunday .. 6 = Saturday.
    ///
    /// Carried through unchanged. Expansion always pins to the base date's
    /// own weekday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<u8>,
}

/// Validation failures for a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    #[error("recurrence interval must be at least 1")]
    NonPositiveInterval,
    #[error("`after` rules need endAfterOccurrences >= 2, got {0:?}")]
    OccurrenceCountTooSmall(Option<u32>),
    #[error("`on` rules need an endOnDate")]
    MissingEndDate,
    #[error("endOnDate {end_on} is before the base date {base}")]
    EndDateBeforeBase { base: NaiveDate, end_on: NaiveDate },
    #[error("weekday hint must be within 0..=6, got {0}")]
    InvalidWeekday(u8),
}

impl RecurrenceConfig {
    /// Creates a rule with `interval = 1` that never ends.
    pub fn new(kind: RecurrenceType) -> Self {
        Self {
            kind,
            interval: 1,
            end_type: EndType::Never,
            end_after_occurrences: None,
            end_on_date: None,
            weekday: None,
        }
    }

    /// Sets the step multiplier.
    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Terminates after `count` occurrences, base included.
    pub fn ending_after(mut self, count: u32) -> Self {
        self.end_type = EndType::After;
        self.end_after_occurrences = Some(count);
        self.end_on_date = None;
        self
    }

    /// Terminates after the inclusive date `last`.
    pub fn ending_on(mut self, last: NaiveDate) -> Self {
        self.end_type = EndType::On;
        self.end_on_date = Some(last);
        self.end_after_occurrences = None;
        self
    }

    /// Returns whether this rule generates any instances at all.
    pub fn is_recurring(&self) -> bool {
        self.kind != RecurrenceType::None
    }

    /// Interval actually used when stepping.
    pub fn effective_interval(&self) -> u32 {
        match self.kind {
            RecurrenceType::Weekday => 1,
            _ => self.interval,
        }
    }

    /// Caller-side validation, run before expansion.
    ///
    /// `base_date` is the date of the root event the rule is attached to.
    ///
    /// # Errors
    /// - Interval of zero on any stepping type other than `weekday`.
    /// - `after` without a count of at least 2.
    /// - `on` without a date, or with a date before `base_date`.
    /// - A weekday hint outside `0..=6`.
    pub fn validate(&self, base_date: NaiveDate) -> Result<(), RecurrenceError> {
        if !self.is_recurring() {
            return Ok(());
        }

        if self.kind != RecurrenceType::Weekday && self.interval == 0 {
            return Err(RecurrenceError::NonPositiveInterval);
        }

        match self.end_type {
            EndType::Never => {}
            EndType::After => match self.end_after_occurrences {
                Some(count) if count >= 2 => {}
                other => return Err(RecurrenceError::OccurrenceCountTooSmall(other)),
            },
            EndType::On => {
                let end_on = self.end_on_date.ok_or(RecurrenceError::MissingEndDate)?;
                if end_on < base_date {
                    return Err(RecurrenceError::EndDateBeforeBase {
                        base: base_date,
                        end_on,
                    });
                }
            }
        }

        if let Some(weekday) = self.weekday {
            if weekday > 6 {
                return Err(RecurrenceError::InvalidWeekday(weekday));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{EndType, RecurrenceConfig, RecurrenceError, RecurrenceType};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekday_ignores_stored_interval() {
        let rule = RecurrenceConfig::new(RecurrenceType::Weekday).every(0);
        assert_eq!(rule.effective_interval(), 1);
        assert!(rule.validate(date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let rule = RecurrenceConfig::new(RecurrenceType::Daily).every(0);
        assert_eq!(
            rule.validate(date(2024, 1, 1)),
            Err(RecurrenceError::NonPositiveInterval)
        );
    }

    #[test]
    fn validate_rejects_single_occurrence_after_rule() {
        let rule = RecurrenceConfig::new(RecurrenceType::Weekly).ending_after(1);
        assert_eq!(
            rule.validate(date(2024, 1, 1)),
            Err(RecurrenceError::OccurrenceCountTooSmall(Some(1)))
        );
    }

    #[test]
    fn validate_requires_end_date_for_on_rules() {
        let mut rule = RecurrenceConfig::new(RecurrenceType::Monthly);
        rule.end_type = EndType::On;
        assert_eq!(
            rule.validate(date(2024, 1, 1)),
            Err(RecurrenceError::MissingEndDate)
        );
    }

    #[test]
    fn none_rule_is_always_valid() {
        let rule = RecurrenceConfig::new(RecurrenceType::None).every(0);
        assert!(!rule.is_recurring());
        assert!(rule.validate(date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn wire_shape_uses_camel_case_keys() {
        let rule = RecurrenceConfig::new(RecurrenceType::Weekly)
            .every(2)
            .ending_after(4);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "weekly");
        assert_eq!(json["interval"], 2);
        assert_eq!(json["endType"], "after");
        assert_eq!(json["endAfterOccurrences"], 4);
        assert!(json.get("endOnDate").is_none());
    }
}
