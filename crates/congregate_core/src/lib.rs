//! Scheduling core for Congregate.
//! This crate is the single source of truth for recurrence and layout
//! invariants.

pub mod calendar;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use calendar::agenda::DayAgenda;
pub use calendar::layout::{layout_day, now_indicator, HourRange, PositionedEvent, SlotGeometry};
pub use calendar::local_date::{
    format_local_date, format_time_hhmm, parse_local_date, parse_time_hhmm, DateParseError,
};
pub use calendar::recurrence::{expand, expand_with_limits, ExpansionLimits};
pub use calendar::series::{
    is_child, is_part_of_series, is_root_with_children, series_root_id, MutationScope,
};
pub use calendar::window::{events_by_date, events_on, occurs_on};
pub use config::{ConfigError, CoreConfig, LoggingConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::event::{Event, EventId, EventPatch, EventValidationError};
pub use model::recurrence::{EndType, RecurrenceConfig, RecurrenceError, RecurrenceType};
pub use repo::event_repo::{
    DeleteTarget, EventListQuery, EventRepository, RepoError, RepoResult, SqliteEventRepository,
};
pub use service::series_service::{
    SeriesCreated, SeriesResult, SeriesService, SeriesServiceError, SeriesUpdated,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
