//! Series mutation use-case service.
//!
//! # Responsibility
//! - Create a root event together with its expanded instances.
//! - Edit or delete one occurrence or a whole series.
//! - Rebuild a series from scratch when its rule changes.
//!
//! # Invariants
//! - Rules are validated before any store call is issued.
//! - A single-occurrence update never writes a recurrence rule.
//! - A series delete leaves no record pointing at the deleted root.
//! - Regeneration always deletes then rebuilds; it never diffs dates, so a
//!   partially failed run is repaired by running it again.
//!
//! Store calls are issued one after another without a surrounding
//! transaction. Callers serialize mutations per series.

use crate::calendar::local_date::add_days;
use crate::calendar::recurrence::{expand_with_limits, ExpansionLimits};
use crate::calendar::series::{series_root_id, MutationScope};
use crate::model::event::{Event, EventId, EventPatch, EventValidationError};
use crate::model::recurrence::{RecurrenceConfig, RecurrenceError};
use crate::repo::event_repo::{DeleteTarget, EventListQuery, EventRepository, RepoError};
use log::{info, warn};
use std::slice;
use thiserror::Error;

/// Errors from series mutation operations.
#[derive(Debug, Error)]
pub enum SeriesServiceError {
    #[error("event not found: {0}")]
    EventNotFound(EventId),
    #[error("event {0} is a generated instance, not a series root")]
    GeneratedInstance(EventId),
    #[error(transparent)]
    InvalidEvent(#[from] EventValidationError),
    #[error(transparent)]
    InvalidRecurrence(#[from] RecurrenceError),
    /// Store failure, passed through unchanged.
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type SeriesResult<T> = Result<T, SeriesServiceError>;

/// Result of creating an event and its instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesCreated {
    pub root_id: EventId,
    /// Generated instance ids in chronological order.
    pub child_ids: Vec<EventId>,
}

/// Result of a series-level update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesUpdated {
    /// Root as written to the store.
    pub root: Event,
    /// Existing children patched in place.
    pub updated_children: usize,
    /// Children deleted by regeneration.
    pub removed_children: usize,
    /// Children inserted by regeneration.
    pub inserted_children: Vec<EventId>,
}

/// Series mutation facade over an event store.
pub struct SeriesService<R: EventRepository> {
    repo: R,
    limits: ExpansionLimits,
}

impl<R: EventRepository> SeriesService<R> {
    /// Creates a service with default expansion caps.
    pub fn new(repo: R) -> Self {
        Self::with_limits(repo, ExpansionLimits::default())
    }

    pub fn with_limits(repo: R, limits: ExpansionLimits) -> Self {
        Self { repo, limits }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Persists `base` and, for a recurring root, its expanded instances.
    ///
    /// The root is inserted first, then all instances in one store call.
    pub fn create_event(&self, mut base: Event) -> SeriesResult<SeriesCreated> {
        if base.parent_event_id.is_some() {
            return Err(SeriesServiceError::GeneratedInstance(base.id));
        }
        base.normalize_all_day_times();
        base.validate()?;
        if let Some(rule) = &base.recurrence {
            rule.validate(base.date)?;
        }

        self.repo.insert_events(slice::from_ref(&base))?;

        let child_ids = match base.recurrence.as_ref() {
            Some(rule) if rule.is_recurring() => self.insert_instances(&base, rule)?,
            _ => Vec::new(),
        };

        info!(
            "event=series_create module=service status=ok root_id={} children={}",
            base.id,
            child_ids.len()
        );
        Ok(SeriesCreated {
            root_id: base.id,
            child_ids,
        })
    }

    /// Deletes exactly one record. Siblings and root are untouched.
    pub fn delete_one(&self, id: EventId) -> SeriesResult<()> {
        let removed = self.repo.delete_events(&DeleteTarget::Ids(vec![id]))?;
        if removed == 0 {
            return Err(SeriesServiceError::EventNotFound(id));
        }
        info!("event=event_delete module=service status=ok event_id={id}");
        Ok(())
    }

    /// Deletes every child of the series, then its root.
    ///
    /// `id` may name the root or any of its instances. Returns the number of
    /// records removed.
    pub fn delete_series(&self, id: EventId) -> SeriesResult<usize> {
        let root_id = match self.repo.get_event(id)? {
            Some(event) => series_root_id(&event),
            None => id,
        };

        let children = self
            .repo
            .delete_events(&DeleteTarget::ChildrenOf(root_id))?;
        let root = self.repo.delete_events(&DeleteTarget::Ids(vec![root_id]))?;
        if children + root == 0 {
            return Err(SeriesServiceError::EventNotFound(id));
        }

        info!(
            "event=series_delete module=service status=ok root_id={} removed={}",
            root_id,
            children + root
        );
        Ok(children + root)
    }

    /// Applies `patch` to exactly one record.
    ///
    /// A recurrence in the patch is dropped: a rule is meaningless on a
    /// single occurrence.
    pub fn update_one(&self, id: EventId, patch: &EventPatch) -> SeriesResult<Event> {
        if patch.has_recurrence() {
            warn!(
                "event=event_update module=service status=ignored event_id={id} field=recurrence"
            );
        }
        let patch = patch.without_recurrence();

        let mut event = self.load(id)?;
        patch.apply_to(&mut event);
        event.validate()?;
        self.repo.update_event(&event)?;

        info!("event=event_update module=service status=ok event_id={id}");
        Ok(event)
    }

    /// Applies `patch` to the root and every existing child.
    ///
    /// `date` and `end_date` move the root only; children keep their own
    /// dates and take the root's window span. With `regenerate` and a
    /// recurring rule in the patch, existing children are deleted and the
    /// series is expanded again from the updated root.
    pub fn update_series(
        &self,
        root_id: EventId,
        patch: &EventPatch,
        regenerate: bool,
    ) -> SeriesResult<SeriesUpdated> {
        let mut root = self.load(root_id)?;
        if root.parent_event_id.is_some() {
            return Err(SeriesServiceError::GeneratedInstance(root_id));
        }

        patch.apply_to(&mut root);
        if let Some(rule) = &patch.recurrence {
            root.recurrence = rule.is_recurring().then(|| rule.clone());
        }
        root.validate()?;

        if patch.has_recurrence() {
            if let Some(rule) = &root.recurrence {
                rule.validate(root.date)?;
            }
        }
        let regenerate_with = if regenerate && patch.has_recurrence() {
            root.recurrence.clone()
        } else {
            None
        };

        self.repo.update_event(&root)?;

        let outcome = match regenerate_with {
            Some(rule) => {
                let removed_children = self
                    .repo
                    .delete_events(&DeleteTarget::ChildrenOf(root_id))?;
                let inserted_children = self.insert_instances(&root, &rule)?;
                SeriesUpdated {
                    root,
                    updated_children: 0,
                    removed_children,
                    inserted_children,
                }
            }
            None => {
                let updated_children = self.patch_children(&root, patch)?;
                SeriesUpdated {
                    root,
                    updated_children,
                    removed_children: 0,
                    inserted_children: Vec::new(),
                }
            }
        };

        info!(
            "event=series_update module=service status=ok root_id={} updated={} removed={} inserted={}",
            root_id,
            outcome.updated_children,
            outcome.removed_children,
            outcome.inserted_children.len()
        );
        Ok(outcome)
    }

    /// Deletes with the scope chosen by the user.
    pub fn delete(&self, id: EventId, scope: MutationScope) -> SeriesResult<usize> {
        match scope {
            MutationScope::Occurrence => self.delete_one(id).map(|()| 1),
            MutationScope::Series => self.delete_series(id),
        }
    }

    /// Updates with the scope chosen by the user.
    ///
    /// A series-scoped update regenerates when the patch carries a rule.
    pub fn update(
        &self,
        id: EventId,
        patch: &EventPatch,
        scope: MutationScope,
    ) -> SeriesResult<Event> {
        match scope {
            MutationScope::Occurrence => self.update_one(id, patch),
            MutationScope::Series => {
                let root_id = series_root_id(&self.load(id)?);
                self.update_series(root_id, patch, patch.has_recurrence())
                    .map(|outcome| outcome.root)
            }
        }
    }

    fn load(&self, id: EventId) -> SeriesResult<Event> {
        self.repo
            .get_event(id)?
            .ok_or(SeriesServiceError::EventNotFound(id))
    }

    fn insert_instances(
        &self,
        root: &Event,
        rule: &RecurrenceConfig,
    ) -> SeriesResult<Vec<EventId>> {
        let instances = expand_with_limits(root, rule, &self.limits);
        if instances.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.insert_events(&instances)?)
    }

    fn patch_children(&self, root: &Event, patch: &EventPatch) -> SeriesResult<usize> {
        let children = self.repo.list_events(&EventListQuery {
            parent_event_id: Some(root.id),
            ..EventListQuery::default()
        })?;
        let moves_window = patch.date.is_some() || patch.end_date.is_some();
        let span = u64::try_from(root.window_span_days()).unwrap_or(0);

        let count = children.len();
        for mut child in children {
            patch.apply_shared(&mut child);
            if moves_window {
                child.end_date = root.end_date.and_then(|_| add_days(child.date, span));
            }
            child.validate()?;
            self.repo.update_event(&child)?;
        }

        Ok(count)
    }
}
