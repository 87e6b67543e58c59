//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store effects consumed by series mutation.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Event::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod event_repo;
