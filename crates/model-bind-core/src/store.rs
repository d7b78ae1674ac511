//! Store contract shared by model backends.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::event::{ChangeEvent, EventContext};
use crate::path::Path;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),
    #[error("operation not valid at document root")]
    InvalidRootOp,
    #[error("path not found")]
    PathNotFound,
    #[error("path does not point to object")]
    NotObject,
    #[error("path does not point to array")]
    NotArray,
    #[error("path does not point to a finite number")]
    NotNumber,
    #[error("array index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Handle to one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        ListenerId(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// A mutable JSON document shared between components, with change
/// notification.
///
/// Every mutation is tagged with the caller's [`EventContext`] and emits
/// exactly one [`ChangeEvent`]. Listeners observe a path and receive the
/// events whose path is prefix-related to it: changes at the path itself,
/// beneath it, or at an ancestor that rewrote it.
///
/// Implementations are single-threaded; handles are shared through
/// `Rc<dyn ModelStore>`.
pub trait ModelStore {
    /// Deep copy of the value at `path`. `None` when nothing is there.
    fn read(&self, path: &Path) -> Option<Value>;

    /// Overwrites `path` with `value`, creating missing intermediate
    /// objects.
    fn set(&self, path: &Path, value: Value, context: EventContext) -> Result<(), ModelError>;

    /// Writes `value` only when `path` holds nothing or `null`. Returns
    /// whether the write happened.
    fn set_if_missing(
        &self,
        path: &Path,
        value: Value,
        context: EventContext,
    ) -> Result<bool, ModelError>;

    /// Inserts `value` at `index` into the array at `path`.
    fn insert(
        &self,
        path: &Path,
        index: usize,
        value: Value,
        context: EventContext,
    ) -> Result<(), ModelError>;

    /// Removes the node at `path`, returning the removed value. Removing a
    /// node that is not there is a no-op returning `Ok(None)`.
    fn remove(&self, path: &Path, context: EventContext) -> Result<Option<Value>, ModelError>;

    /// Adds `by` to the number at `path` and returns the new value. Nothing
    /// or `null` counts as zero.
    fn increment(&self, path: &Path, by: f64, context: EventContext) -> Result<f64, ModelError>;

    /// Registers `listener` for events prefix-related to `path`, attributed
    /// to `context`.
    fn observe(
        &self,
        path: &Path,
        context: EventContext,
        listener: Box<dyn Fn(&ChangeEvent)>,
    ) -> ListenerId;

    /// Removes one listener. Returns `false` when the id is unknown.
    fn unobserve(&self, id: ListenerId) -> bool;

    /// Removes every listener registered under `context`, returning how many
    /// were removed.
    fn unobserve_context(&self, context: EventContext) -> usize;
}

/// Compares two store handles by identity rather than contents.
pub fn same_store(a: &Rc<dyn ModelStore>, b: &Rc<dyn ModelStore>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Removes its listener when dropped.
pub struct ListenerGuard {
    store: Rc<dyn ModelStore>,
    id: ListenerId,
}

impl ListenerGuard {
    pub fn new(store: Rc<dyn ModelStore>, id: ListenerId) -> Self {
        ListenerGuard { store, id }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.store.unobserve(self.id);
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard").field("id", &self.id).finish()
    }
}
