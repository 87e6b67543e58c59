//! Pure scheduling algorithms over in-memory events.
//!
//! # Responsibility
//! - Date arithmetic, recurrence expansion, series identity.
//! - Day/week/month selection and time-grid overlap layout.
//!
//! # Invariants
//! - Nothing in this module performs I/O or reads the system clock.
//! - Every function is synchronous and deterministic for the same input,
//!   apart from the fresh ids given to expanded instances.

pub mod agenda;
pub mod layout;
pub mod local_date;
pub mod recurrence;
pub mod series;
pub mod window;
