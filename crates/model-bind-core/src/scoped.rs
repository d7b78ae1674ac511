//! Path-scoped handles over a shared store.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::event::{ChangeEvent, EventContext};
use crate::path::{parse_path, Path};
use crate::store::{same_store, ListenerGuard, ModelError, ModelStore};

/// A store handle fixed to one path and one attribution context.
///
/// Handles are cheap to clone and to derive: [`at`](ScopedModel::at),
/// [`at_key`](ScopedModel::at_key) and [`at_index`](ScopedModel::at_index)
/// produce child handles over the same store and context. Every mutation
/// made through a handle is attributed to its context.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use model_bind_core::{EventContext, MemoryModel, ModelStore, ScopedModel};
/// use serde_json::json;
///
/// let store: Rc<dyn ModelStore> = Rc::new(MemoryModel::new());
/// let root = ScopedModel::new(store, EventContext::generate());
///
/// let message = root.at("_page.message").unwrap();
/// message.set(json!("hello")).unwrap();
/// assert_eq!(message.read(), Some(json!("hello")));
/// ```
#[derive(Clone)]
pub struct ScopedModel {
    store: Rc<dyn ModelStore>,
    path: Path,
    context: EventContext,
}

impl ScopedModel {
    /// Root-scoped handle.
    pub fn new(store: Rc<dyn ModelStore>, context: EventContext) -> Self {
        ScopedModel {
            store,
            path: Path::new(),
            context,
        }
    }

    /// Child handle at a dotted subpath below this one.
    pub fn at(&self, subpath: &str) -> Result<ScopedModel, ModelError> {
        let tail = parse_path(subpath)?;
        Ok(ScopedModel {
            store: Rc::clone(&self.store),
            path: self.path.join(&tail),
            context: self.context,
        })
    }

    /// Child handle one key below this one.
    pub fn at_key(&self, key: impl Into<String>) -> ScopedModel {
        ScopedModel {
            store: Rc::clone(&self.store),
            path: self.path.child_key(key),
            context: self.context,
        }
    }

    /// Child handle one index below this one.
    pub fn at_index(&self, index: usize) -> ScopedModel {
        ScopedModel {
            store: Rc::clone(&self.store),
            path: self.path.child_index(index),
            context: self.context,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn context(&self) -> EventContext {
        self.context
    }

    pub fn store(&self) -> &Rc<dyn ModelStore> {
        &self.store
    }

    /// True when both handles target the same store instance.
    pub fn same_store(&self, other: &ScopedModel) -> bool {
        same_store(&self.store, &other.store)
    }

    /// True when this handle addresses the same store, path, and context as
    /// `other`, making their subscriptions interchangeable.
    pub fn same_binding(&self, other: &ScopedModel) -> bool {
        self.same_store(other) && self.path == other.path && self.context == other.context
    }

    pub fn read(&self) -> Option<Value> {
        self.store.read(&self.path)
    }

    pub fn set(&self, value: Value) -> Result<(), ModelError> {
        self.store.set(&self.path, value, self.context)
    }

    pub fn set_if_missing(&self, value: Value) -> Result<bool, ModelError> {
        self.store.set_if_missing(&self.path, value, self.context)
    }

    pub fn insert(&self, index: usize, value: Value) -> Result<(), ModelError> {
        self.store.insert(&self.path, index, value, self.context)
    }

    pub fn remove(&self) -> Result<Option<Value>, ModelError> {
        self.store.remove(&self.path, self.context)
    }

    pub fn increment(&self, by: f64) -> Result<f64, ModelError> {
        self.store.increment(&self.path, by, self.context)
    }

    /// Registers a listener for changes prefix-related to this handle's
    /// path. The listener stays registered exactly as long as the guard.
    pub fn observe(&self, listener: impl Fn(&ChangeEvent) + 'static) -> ListenerGuard {
        let id = self
            .store
            .observe(&self.path, self.context, Box::new(listener));
        ListenerGuard::new(Rc::clone(&self.store), id)
    }

    /// Removes every listener registered under this handle's context.
    pub fn unobserve_context(&self) -> usize {
        self.store.unobserve_context(self.context)
    }
}

impl fmt::Debug for ScopedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedModel")
            .field("path", &self.path)
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryModel;
    use serde_json::json;
    use std::cell::RefCell;

    fn root_handle() -> (Rc<MemoryModel>, ScopedModel) {
        let model = Rc::new(MemoryModel::new());
        let store = Rc::clone(&model) as Rc<dyn ModelStore>;
        let root = ScopedModel::new(store, EventContext::new(70_000));
        (model, root)
    }

    #[test]
    fn test_descent_builds_paths() {
        let (_, root) = root_handle();
        let handle = root.at_key("users").at_index(3).at_key("name");
        assert_eq!(handle.path().to_string(), "users.3.name");
        let dotted = root.at("users.3.name").unwrap();
        assert_eq!(dotted.path(), handle.path());
    }

    #[test]
    fn test_ops_flow_through_scope() {
        let (model, root) = root_handle();
        let message = root.at("_page.message").unwrap();
        message.set(json!("hi")).unwrap();
        assert_eq!(message.read(), Some(json!("hi")));
        assert_eq!(model.view(), json!({"_page": {"message": "hi"}}));
        assert_eq!(message.remove().unwrap(), Some(json!("hi")));
        assert_eq!(message.read(), None);
    }

    #[test]
    fn test_observe_guard_removes_listener_on_drop() {
        let (model, root) = root_handle();
        let handle = root.at_key("a");
        let guard = handle.observe(|_| {});
        assert_eq!(model.listener_count(), 1);
        drop(guard);
        assert_eq!(model.listener_count(), 0);
    }

    #[test]
    fn test_observe_sees_scoped_changes() {
        let (_, root) = root_handle();
        let handle = root.at_key("a");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _guard = handle.observe(move |event| sink.borrow_mut().push(event.clone()));

        handle.at_key("b").set(json!(1)).unwrap();
        root.at_key("other").set(json!(2)).unwrap();

        let events = seen.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path.to_string(), "a.b");
    }

    #[test]
    fn test_same_binding_compares_all_three_keys() {
        let (model, root) = root_handle();
        let a = root.at_key("a");
        assert!(a.same_binding(&root.at_key("a")));
        assert!(!a.same_binding(&root.at_key("b")));

        let other_context = ScopedModel::new(
            Rc::clone(&model) as Rc<dyn ModelStore>,
            EventContext::new(80_000),
        );
        assert!(!a.same_binding(&other_context.at_key("a")));

        let other_store: Rc<dyn ModelStore> = Rc::new(MemoryModel::new());
        let foreign = ScopedModel::new(other_store, a.context());
        assert!(!a.same_binding(&foreign.at_key("a")));
    }

    #[test]
    fn test_unobserve_context_clears_own_listeners() {
        let (model, root) = root_handle();
        let guard = root.at_key("a").observe(|_| {});
        let _kept = ScopedModel::new(
            Rc::clone(&model) as Rc<dyn ModelStore>,
            EventContext::new(90_000),
        )
        .at_key("a")
        .observe(|_| {});

        assert_eq!(root.unobserve_context(), 1);
        assert_eq!(model.listener_count(), 1);
        // Guard drop after bulk removal is a harmless double-unobserve.
        drop(guard);
        assert_eq!(model.listener_count(), 1);
    }
}
