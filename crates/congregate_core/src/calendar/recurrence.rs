//! Recurrence expansion into materialized instances.
//!
//! # Responsibility
//! - Turn one root event plus its rule into an ordered list of child events.
//! - Bound open-ended rules with silent caps.
//!
//! # Invariants
//! - Output is strictly increasing by `date`.
//! - No returned instance carries a `recurrence`.
//! - Every returned instance points at the base event via `parent_event_id`.
//! - The base occurrence itself is never part of the output.

use crate::calendar::local_date::{add_days, add_months, add_weeks, add_years};
use crate::model::event::Event;
use crate::model::recurrence::{EndType, RecurrenceConfig, RecurrenceType};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Iteration ceiling for rules that do not end after a fixed count.
pub const DEFAULT_MAX_OCCURRENCES: u32 = 365;

/// How far past the base date a `never` rule may reach.
pub const DEFAULT_NEVER_HORIZON_MONTHS: u32 = 6;

/// Safety caps applied during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionLimits {
    /// Total occurrence ceiling (base included) for `never` and `on` rules.
    pub max_occurrences: u32,
    /// Months past the base date after which `never` rules stop.
    pub never_horizon_months: u32,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            never_horizon_months: DEFAULT_NEVER_HORIZON_MONTHS,
        }
    }
}

/// Expands `base` under `rule` with the default caps.
pub fn expand(base: &Event, rule: &RecurrenceConfig) -> Vec<Event> {
    expand_with_limits(base, rule, &ExpansionLimits::default())
}

/// Expands `base` under `rule`.
///
/// Callers validate the rule first (`RecurrenceConfig::validate`); a rule of
/// type `none` or a zero interval produces no instances.
pub fn expand_with_limits(
    base: &Event,
    rule: &RecurrenceConfig,
    limits: &ExpansionLimits,
) -> Vec<Event> {
    if !rule.is_recurring() {
        return Vec::new();
    }

    let interval = rule.effective_interval();
    if interval == 0 {
        warn!(
            "event=recurrence_expand module=calendar status=error event_id={} error_code=zero_interval",
            base.id
        );
        return Vec::new();
    }

    let ceiling = match rule.end_type {
        EndType::After => rule.end_after_occurrences.unwrap_or(1),
        EndType::Never | EndType::On => limits.max_occurrences,
    };
    let horizon = match rule.end_type {
        EndType::Never => add_months(base.date, limits.never_horizon_months),
        EndType::After | EndType::On => None,
    };
    let window_span = base.window_span_days();

    let mut instances = Vec::new();
    for index in 1..ceiling {
        let Some(candidate) = index
            .checked_mul(interval)
            .and_then(|steps| step_date(base.date, rule.kind, steps))
        else {
            debug!(
                "event=recurrence_expand module=calendar status=truncated event_id={} reason=calendar_overflow",
                base.id
            );
            break;
        };

        if rule.end_type == EndType::On {
            if let Some(last) = rule.end_on_date {
                if candidate > last {
                    break;
                }
            }
        }

        if let Some(horizon) = horizon {
            if candidate > horizon {
                debug!(
                    "event=recurrence_expand module=calendar status=truncated event_id={} reason=never_horizon horizon={}",
                    base.id, horizon
                );
                break;
            }
        }

        instances.push(derive_instance(base, candidate, window_span));
    }

    if rule.end_type != EndType::After && instances.len() + 1 >= ceiling as usize {
        debug!(
            "event=recurrence_expand module=calendar status=truncated event_id={} reason=max_occurrences ceiling={}",
            base.id, ceiling
        );
    }

    instances
}

/// Offsets `base` by `steps` units of the rule type.
///
/// Always computed from the base date rather than the previous candidate, so
/// month-end clamping never compounds (Jan 31 -> Feb 29 -> Mar 31).
fn step_date(base: NaiveDate, kind: RecurrenceType, steps: u32) -> Option<NaiveDate> {
    match kind {
        RecurrenceType::None => None,
        RecurrenceType::Daily => add_days(base, u64::from(steps)),
        RecurrenceType::Weekly | RecurrenceType::Weekday => add_weeks(base, u64::from(steps)),
        RecurrenceType::Monthly => add_months(base, steps),
        RecurrenceType::Yearly => add_years(base, steps),
    }
}

fn derive_instance(base: &Event, date: NaiveDate, window_span: i64) -> Event {
    let end_date = base.end_date.and_then(|_| {
        u64::try_from(window_span)
            .ok()
            .and_then(|span| add_days(date, span))
    });

    Event {
        id: Uuid::new_v4(),
        date,
        end_date,
        recurrence: None,
        parent_event_id: Some(base.id),
        ..base.clone()
    }
}
