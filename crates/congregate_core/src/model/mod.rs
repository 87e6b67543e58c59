//! Domain model for scheduled events.
//!
//! # Responsibility
//! - Define canonical data structures used by scheduling logic.
//! - Keep one record shape for roots, generated instances and standalone
//!   events.
//!
//! # Invariants
//! - Every event is identified by a stable `EventId`.
//! - Recurrence rules live on series roots only.

pub mod event;
pub mod recurrence;
