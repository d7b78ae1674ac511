//! In-memory reference implementation of [`ModelStore`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::event::{ChangeEvent, ChangeKind, EventContext};
use crate::path::{value_at, value_at_mut, Path, PathStep};
use crate::store::{ListenerId, ModelError, ModelStore};

/// Process-local [`ModelStore`] backed by a single JSON document.
///
/// Writes auto-vivify missing intermediate objects: setting `"a.b.c"` into
/// an empty document creates the `a` and `b` objects along the way. Arrays
/// are never created implicitly; an index step must land on an existing
/// array, and only in-bounds overwrites and appends at the current length
/// are accepted.
///
/// # Example
///
/// ```
/// use model_bind_core::{parse_path, EventContext, MemoryModel, ModelStore};
/// use serde_json::json;
///
/// let model = MemoryModel::new();
/// let ctx = EventContext::generate();
/// let path = parse_path("_page.message").unwrap();
///
/// model.set(&path, json!("hello"), ctx).unwrap();
/// assert_eq!(model.read(&path), Some(json!("hello")));
/// ```
pub struct MemoryModel {
    document: RefCell<Value>,
    listeners: RefCell<Vec<ListenerEntry>>,
    next_listener_id: Cell<u64>,
}

struct ListenerEntry {
    id: ListenerId,
    path: Path,
    context: EventContext,
    callback: Rc<dyn Fn(&ChangeEvent)>,
}

impl MemoryModel {
    /// Empty model: the document root is `{}`.
    pub fn new() -> Self {
        MemoryModel::from_value(Value::Object(Map::new()))
    }

    /// Model seeded with an initial document.
    pub fn from_value(document: Value) -> Self {
        MemoryModel {
            document: RefCell::new(document),
            listeners: RefCell::new(Vec::new()),
            next_listener_id: Cell::new(1),
        }
    }

    /// Deep copy of the whole document.
    pub fn view(&self) -> Value {
        self.document.borrow().clone()
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn dispatch(&self, event: ChangeEvent) {
        // Snapshot the matching callbacks and release the registry borrow
        // before running them: a listener may observe, unobserve, or write
        // back into this model.
        let callbacks: Vec<Rc<dyn Fn(&ChangeEvent)>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.path.prefix_related(&event.path))
            .map(|entry| Rc::clone(&entry.callback))
            .collect();
        trace!(
            path = %event.path,
            kind = ?event.kind,
            matched = callbacks.len(),
            "dispatching change event"
        );
        for callback in &callbacks {
            callback(&event);
        }
    }
}

impl Default for MemoryModel {
    fn default() -> Self {
        MemoryModel::new()
    }
}

/// Walks to the slot `path` addresses, creating intermediate objects where
/// the document has nothing or `null`. Index steps stay strict: in-bounds
/// descends, one past the end appends a `null` placeholder, anything else
/// is out of bounds.
fn slot_for_set<'a>(root: &'a mut Value, path: &Path) -> Result<&'a mut Value, ModelError> {
    let mut cur = root;
    for step in path.steps() {
        cur = match step {
            PathStep::Key(key) => {
                if cur.is_null() {
                    *cur = Value::Object(Map::new());
                }
                match cur {
                    Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                    _ => return Err(ModelError::NotObject),
                }
            }
            PathStep::Index(index) => match cur {
                Value::Array(arr) => {
                    let len = arr.len();
                    if *index < len {
                        &mut arr[*index]
                    } else if *index == len {
                        arr.push(Value::Null);
                        &mut arr[*index]
                    } else {
                        return Err(ModelError::IndexOutOfBounds { index: *index, len });
                    }
                }
                _ => return Err(ModelError::NotArray),
            },
        };
    }
    Ok(cur)
}

impl ModelStore for MemoryModel {
    fn read(&self, path: &Path) -> Option<Value> {
        value_at(&self.document.borrow(), path).cloned()
    }

    fn set(&self, path: &Path, value: Value, context: EventContext) -> Result<(), ModelError> {
        let (before, after) = {
            let mut doc = self.document.borrow_mut();
            let before = value_at(&doc, path).cloned();
            let slot = slot_for_set(&mut doc, path)?;
            *slot = value;
            (before, Some(slot.clone()))
        };
        self.dispatch(ChangeEvent {
            path: path.clone(),
            kind: ChangeKind::Set,
            before,
            after,
            context,
        });
        Ok(())
    }

    fn set_if_missing(
        &self,
        path: &Path,
        value: Value,
        context: EventContext,
    ) -> Result<bool, ModelError> {
        match self.read(path) {
            None | Some(Value::Null) => {
                self.set(path, value, context)?;
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    fn insert(
        &self,
        path: &Path,
        index: usize,
        value: Value,
        context: EventContext,
    ) -> Result<(), ModelError> {
        let (before, after) = {
            let mut doc = self.document.borrow_mut();
            let target = value_at_mut(&mut doc, path).ok_or(ModelError::PathNotFound)?;
            let arr = target.as_array_mut().ok_or(ModelError::NotArray)?;
            if index > arr.len() {
                return Err(ModelError::IndexOutOfBounds {
                    index,
                    len: arr.len(),
                });
            }
            let before = arr.clone();
            arr.insert(index, value);
            (Value::Array(before), Value::Array(arr.clone()))
        };
        self.dispatch(ChangeEvent {
            path: path.clone(),
            kind: ChangeKind::Insert,
            before: Some(before),
            after: Some(after),
            context,
        });
        Ok(())
    }

    fn remove(&self, path: &Path, context: EventContext) -> Result<Option<Value>, ModelError> {
        let (parent_path, leaf) = path.split_leaf().ok_or(ModelError::InvalidRootOp)?;
        let mut doc = self.document.borrow_mut();
        let parent = value_at_mut(&mut doc, &parent_path).ok_or(ModelError::PathNotFound)?;
        match (leaf, parent) {
            (PathStep::Key(key), Value::Object(map)) => {
                let removed = match map.remove(key) {
                    Some(removed) => removed,
                    None => return Ok(None),
                };
                drop(doc);
                self.dispatch(ChangeEvent {
                    path: path.clone(),
                    kind: ChangeKind::Remove,
                    before: Some(removed.clone()),
                    after: None,
                    context,
                });
                Ok(Some(removed))
            }
            (PathStep::Index(index), Value::Array(arr)) => {
                if *index >= arr.len() {
                    return Ok(None);
                }
                let before = arr.clone();
                let removed = arr.remove(*index);
                let after = arr.clone();
                drop(doc);
                self.dispatch(ChangeEvent {
                    path: parent_path,
                    kind: ChangeKind::Remove,
                    before: Some(Value::Array(before)),
                    after: Some(Value::Array(after)),
                    context,
                });
                Ok(Some(removed))
            }
            (PathStep::Key(_), _) => Err(ModelError::NotObject),
            (PathStep::Index(_), _) => Err(ModelError::NotArray),
        }
    }

    fn increment(&self, path: &Path, by: f64, context: EventContext) -> Result<f64, ModelError> {
        let current = match self.read(path) {
            None | Some(Value::Null) => 0.0,
            Some(Value::Number(n)) => n.as_f64().ok_or(ModelError::NotNumber)?,
            Some(_) => return Err(ModelError::NotNumber),
        };
        let next = current + by;
        let number = serde_json::Number::from_f64(next).ok_or(ModelError::NotNumber)?;
        self.set(path, Value::Number(number), context)?;
        Ok(next)
    }

    fn observe(
        &self,
        path: &Path,
        context: EventContext,
        listener: Box<dyn Fn(&ChangeEvent)>,
    ) -> ListenerId {
        let id = ListenerId::new(self.next_listener_id.get());
        self.next_listener_id
            .set(self.next_listener_id.get().saturating_add(1));
        self.listeners.borrow_mut().push(ListenerEntry {
            id,
            path: path.clone(),
            context,
            callback: Rc::from(listener),
        });
        debug!(listener = ?id, path = %path, context = %context, "listener registered");
        id
    }

    fn unobserve(&self, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            let before = listeners.len();
            listeners.retain(|entry| entry.id != id);
            listeners.len() < before
        };
        if removed {
            debug!(listener = ?id, "listener removed");
        }
        removed
    }

    fn unobserve_context(&self, context: EventContext) -> usize {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            let before = listeners.len();
            listeners.retain(|entry| entry.context != context);
            before - listeners.len()
        };
        if removed > 0 {
            debug!(context = %context, removed, "context listeners removed");
        }
        removed
    }
}
