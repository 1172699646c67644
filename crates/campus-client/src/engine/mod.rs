//! Optimistic mutation engine.
//!
//! A mutation moves through `Idle -> Pending -> {Confirmed, RolledBack}`.
//! Going pending is synchronous: the list is spliced immediately and a
//! [`Mutation`] ticket records exactly what was done. The caller then sends
//! the request without holding any lock, and settles the ticket against the
//! same list with [`OptimisticList::confirm`] or
//! [`OptimisticList::rollback`].
//!
//! Provisional records never coexist with their confirmed counterpart:
//! confirmation replaces by temporary id, and a server id already present
//! in the list replaces that entry instead of adding a second copy.

mod list;

pub use list::OptimisticList;

use campus_shared::models::{Comment, Event, NewsItem, Opportunity, Post, Resource};
use campus_shared::types::EntityId;

/// A record the engine can track.
pub trait Entity: Clone {
    fn id(&self) -> &EntityId;
    fn set_id(&mut self, id: EntityId);
}

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> &EntityId {
                    &self.id
                }

                fn set_id(&mut self, id: EntityId) {
                    self.id = id;
                }
            }
        )*
    };
}

impl_entity!(Post, Comment, Event, NewsItem, Resource, Opportunity);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Pending,
    Confirmed,
    RolledBack,
}

/// A reversible in-place change. `undo` must restore exactly what `apply`
/// changed; a toggle uses the same function for both.
pub struct Patch<T> {
    pub apply: fn(&mut T),
    pub undo: fn(&mut T),
}

impl<T> Patch<T> {
    pub fn new(apply: fn(&mut T), undo: fn(&mut T)) -> Self {
        Self { apply, undo }
    }

    pub fn toggle(flip: fn(&mut T)) -> Self {
        Self {
            apply: flip,
            undo: flip,
        }
    }
}

impl<T> Clone for Patch<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Patch<T> {}

impl<T> std::fmt::Debug for Patch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Patch")
    }
}

/// What going pending did to the list.
#[derive(Debug, Clone)]
pub enum Change<T> {
    /// A provisional record was prepended.
    Create { temp_id: EntityId },
    /// A record was replaced in place; `previous` is the old copy.
    Replace { id: EntityId, previous: T },
    /// A record was filtered out from `index`.
    Remove { index: usize, removed: T },
    /// A reversible patch was applied to the record.
    Patch { id: EntityId, patch: Patch<T> },
}

/// Ticket for one in-flight mutation.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    change: Change<T>,
    state: MutationState,
}

impl<T> Mutation<T> {
    fn pending(change: Change<T>) -> Self {
        Self {
            change,
            state: MutationState::Pending,
        }
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    pub fn change(&self) -> &Change<T> {
        &self.change
    }

    pub fn is_pending(&self) -> bool {
        self.state == MutationState::Pending
    }

    /// Provisional id of a create, `None` for other changes.
    pub fn temp_id(&self) -> Option<&EntityId> {
        match self.change {
            Change::Create { ref temp_id } => Some(temp_id),
            _ => None,
        }
    }
}

/// Result of confirming a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Confirmed,
    /// The server accepted a create but returned no record; the provisional
    /// copy was dropped and the list should be fetched again.
    NeedsRefetch,
}
