//! The state bridge: component-local reactive state backed by a model path.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use model_bind_core::{ListenerGuard, ModelError, Observable, Path, ScopedModel, Subscription};

/// One component's live link between its rendered value and a model path.
///
/// The binding owns a mirror [`Observable`] holding the latest deep-copied
/// value at the bound path. [`bind`](Self::bind) is meant to be re-invoked
/// on every render: the model listener is swapped out only when the store,
/// path, or context actually changed, so steady-state re-renders cost one
/// read and two comparisons.
///
/// Dropping the binding removes its model listener.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use model_bind::StateBinding;
/// use model_bind_core::{EventContext, MemoryModel, ModelStore, ScopedModel};
/// use serde_json::json;
///
/// let store: Rc<dyn ModelStore> = Rc::new(MemoryModel::new());
/// let root = ScopedModel::new(store, EventContext::generate());
/// let message = root.at("_page.message").unwrap();
///
/// let mut binding = StateBinding::new();
/// let state = binding.bind(&message, Some(json!(""))).unwrap();
/// assert_eq!(state.value(), Some(&json!("")));
///
/// // External writes reach the mirror; the setter writes back.
/// message.set(json!("hello")).unwrap();
/// assert_eq!(binding.value(), Some(json!("hello")));
/// state.setter().set(json!("world")).unwrap();
/// assert_eq!(message.read(), Some(json!("world")));
/// ```
pub struct StateBinding {
    mirror: Observable<Option<Value>>,
    subscription: Option<PathSubscription>,
}

struct PathSubscription {
    handle: ScopedModel,
    _guard: ListenerGuard,
}

impl StateBinding {
    pub fn new() -> Self {
        StateBinding {
            mirror: Observable::new(None),
            subscription: None,
        }
    }

    /// Binds (or re-binds) to `handle`'s path and returns this render's
    /// value/setter pair.
    ///
    /// Reads the current value, writes `default` when the path holds
    /// nothing or `null`, refreshes the mirror, and keeps exactly one model
    /// listener alive. A present value is never replaced by the default.
    pub fn bind(
        &mut self,
        handle: &ScopedModel,
        default: Option<Value>,
    ) -> Result<BoundState, ModelError> {
        let mut current = handle.read();
        if matches!(current, None | Some(Value::Null)) {
            if let Some(default) = default {
                handle.set_if_missing(default.clone())?;
                debug!(path = %handle.path(), "applied default for unset path");
                current = Some(default);
            }
        }
        self.mirror.set(current.clone());
        self.ensure_subscription(handle);
        Ok(BoundState {
            value: current,
            setter: Setter {
                handle: handle.clone(),
            },
        })
    }

    fn ensure_subscription(&mut self, handle: &ScopedModel) {
        if let Some(active) = &self.subscription {
            if active.handle.same_binding(handle) {
                return;
            }
        }
        if let Some(stale) = self.subscription.take() {
            debug!(
                old = %stale.handle.path(),
                new = %handle.path(),
                "rebinding to a different target"
            );
        }
        let mirror = self.mirror.clone();
        let store = Rc::downgrade(handle.store());
        let path = handle.path().clone();
        let guard = handle.observe(move |_event| {
            // Any prefix-related change may have altered the value here;
            // re-read the store rather than reassembling it from the event.
            if let Some(store) = store.upgrade() {
                mirror.set(store.read(&path));
            }
        });
        self.subscription = Some(PathSubscription {
            handle: handle.clone(),
            _guard: guard,
        });
    }

    /// Latest mirrored value.
    pub fn value(&self) -> Option<Value> {
        self.mirror.get()
    }

    /// Re-render trigger: fires whenever the mirrored value really changes.
    /// Equal-value writes to the model never reach these subscribers.
    pub fn subscribe(&self, callback: impl Fn(&Option<Value>) + 'static) -> Subscription {
        self.mirror.subscribe(callback)
    }

    /// Path currently bound, if any.
    pub fn bound_path(&self) -> Option<&Path> {
        self.subscription.as_ref().map(|sub| sub.handle.path())
    }
}

impl Default for StateBinding {
    fn default() -> Self {
        StateBinding::new()
    }
}

impl fmt::Debug for StateBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBinding")
            .field("bound_path", &self.bound_path())
            .finish()
    }
}

/// Snapshot returned by [`StateBinding::bind`]: the value as of this render
/// plus the setter half of the pair.
pub struct BoundState {
    value: Option<Value>,
    setter: Setter,
}

impl BoundState {
    /// Deep-copied value at the bound path. `None` when the path is unset
    /// and no default was given.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn setter(&self) -> Setter {
        self.setter.clone()
    }

    /// Splits into the `(value, setter)` pair.
    pub fn into_parts(self) -> (Option<Value>, Setter) {
        (self.value, self.setter)
    }
}

impl fmt::Debug for BoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundState")
            .field("value", &self.value)
            .finish()
    }
}

/// Write half of a bound state.
#[derive(Clone)]
pub struct Setter {
    handle: ScopedModel,
}

impl Setter {
    /// Overwrites the bound path with `value`. The write is a direct
    /// replacement, not a merge, and it flows back through the binding's
    /// own listener like any other model change.
    pub fn set(&self, value: Value) -> Result<(), ModelError> {
        self.handle.set(value)
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("path", self.handle.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_bind_core::{EventContext, MemoryModel, ModelStore};
    use serde_json::json;

    fn setup() -> (Rc<MemoryModel>, ScopedModel) {
        let model = Rc::new(MemoryModel::new());
        let store = Rc::clone(&model) as Rc<dyn ModelStore>;
        (model, ScopedModel::new(store, EventContext::new(70_000)))
    }

    #[test]
    fn test_bind_installs_one_listener() {
        let (model, root) = setup();
        let mut binding = StateBinding::new();
        binding.bind(&root.at_key("a"), None).unwrap();
        assert_eq!(model.listener_count(), 1);

        // Same store, path, and context: the listener is reused.
        binding.bind(&root.at_key("a"), None).unwrap();
        assert_eq!(model.listener_count(), 1);
    }

    #[test]
    fn test_drop_removes_listener() {
        let (model, root) = setup();
        let mut binding = StateBinding::new();
        binding.bind(&root.at_key("a"), None).unwrap();
        drop(binding);
        assert_eq!(model.listener_count(), 0);
    }

    #[test]
    fn test_setter_round_trips_through_model() {
        let (_, root) = setup();
        let handle = root.at_key("a");
        let mut binding = StateBinding::new();
        let (initial, setter) = binding.bind(&handle, None).unwrap().into_parts();
        assert_eq!(initial, None);

        setter.set(json!(5)).unwrap();
        assert_eq!(handle.read(), Some(json!(5)));
        assert_eq!(binding.value(), Some(json!(5)));
    }

    #[test]
    fn test_bound_path_tracks_rebinds() {
        let (_, root) = setup();
        let mut binding = StateBinding::new();
        assert!(binding.bound_path().is_none());

        binding.bind(&root.at_key("a"), None).unwrap();
        assert_eq!(binding.bound_path().map(|p| p.to_string()), Some("a".into()));

        binding.bind(&root.at_key("b"), None).unwrap();
        assert_eq!(binding.bound_path().map(|p| p.to_string()), Some("b".into()));
    }
}
