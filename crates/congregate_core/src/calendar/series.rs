//! Series identity derived from event data shape.
//!
//! A series is the root plus every event whose `parent_event_id` equals the
//! root's id. Nothing here mutates; there is no stored series flag.

use crate::model::event::{Event, EventId};

/// Target of an edit or delete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationScope {
    /// Only the selected record.
    Occurrence,
    /// The root and all of its generated instances.
    Series,
}

/// Returns whether `event` was generated from a root.
pub fn is_child(event: &Event) -> bool {
    event.parent_event_id.is_some()
}

/// Returns whether any other event in `all` points at `event` as its root.
pub fn is_root_with_children(event: &Event, all: &[Event]) -> bool {
    all.iter()
        .any(|other| other.id != event.id && other.parent_event_id == Some(event.id))
}

/// Returns whether `event` belongs to a series, as root or as instance.
pub fn is_part_of_series(event: &Event, all: &[Event]) -> bool {
    is_child(event) || is_root_with_children(event, all)
}

/// Returns the id of the root owning `event`'s series.
///
/// For a standalone event this is its own id.
pub fn series_root_id(event: &Event) -> EventId {
    event.parent_event_id.unwrap_or(event.id)
}

/// Returns the generated instances of `root_id`, in collection order.
pub fn children_of(root_id: EventId, all: &[Event]) -> Vec<&Event> {
    all.iter()
        .filter(|event| event.parent_event_id == Some(root_id))
        .collect()
}

/// Returns root followed by its children sorted by date.
///
/// The root is omitted when it is not part of `all`.
pub fn series_members(root_id: EventId, all: &[Event]) -> Vec<&Event> {
    let mut children = children_of(root_id, all);
    children.sort_by_key(|event| (event.date, event.id));

    all.iter()
        .filter(|event| event.id == root_id)
        .chain(children)
        .collect()
}

/// Scopes a UI or API action must offer for `event`.
///
/// A lone event only offers `Occurrence`; series members offer both.
pub fn scope_choices(event: &Event, all: &[Event]) -> Vec<MutationScope> {
    if is_part_of_series(event, all) {
        vec![MutationScope::Occurrence, MutationScope::Series]
    } else {
        vec![MutationScope::Occurrence]
    }
}
