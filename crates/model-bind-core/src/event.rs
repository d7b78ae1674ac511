//! Change events and the contexts that attribute them.

use std::fmt;

use rand::Rng;
use serde_json::Value;

use crate::path::Path;

/// Minimum id produced by [`EventContext::generate`]. Lower ids are left to
/// callers that assign contexts by hand.
pub const MIN_CONTEXT_ID: u64 = 65_536;

/// Identifies the party responsible for a group of listeners and mutations.
///
/// A host component typically generates one context, tags every mutation and
/// listener it creates with it, and tears all of them down at once through
/// [`ModelStore::unobserve_context`](crate::store::ModelStore::unobserve_context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventContext(u64);

impl EventContext {
    pub fn new(id: u64) -> Self {
        EventContext(id)
    }

    /// Fresh random context in the `MIN_CONTEXT_ID..=i64::MAX` range.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        EventContext(rng.gen_range(MIN_CONTEXT_ID..=i64::MAX as u64))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which mutation produced a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Insert,
    Remove,
}

/// A single mutation of the shared document, as delivered to listeners.
///
/// `path` is where the mutation happened. For object-key writes and removals
/// that is the full path of the affected node; for array insertions and
/// array-element removals it is the containing array, with `before` and
/// `after` holding the whole array so index shifts stay visible.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub path: Path,
    pub kind: ChangeKind,
    /// Value at `path` before the mutation. `None` when nothing was there.
    pub before: Option<Value>,
    /// Value at `path` after the mutation. `None` when the node was removed.
    pub after: Option<Value>,
    /// Context the mutating call was made under.
    pub context: EventContext,
}
