//! Core contracts for binding reactive UI state to a shared JSON model.
//!
//! The pieces here are UI-framework agnostic:
//!
//! - [`Path`] / [`parse_path`]: dotted addresses into the document.
//! - [`ChangeEvent`] / [`EventContext`]: what mutations emit, and who they
//!   are attributed to.
//! - [`ModelStore`]: the store contract, with [`MemoryModel`] as the
//!   process-local implementation.
//! - [`ScopedModel`]: a cheap handle fixing a store, path, and context.
//! - [`Observable`]: the consumer-side trigger cell with RAII
//!   subscriptions.

pub mod event;
pub mod memory;
pub mod observable;
pub mod path;
pub mod scoped;
pub mod store;

pub use event::{ChangeEvent, ChangeKind, EventContext, MIN_CONTEXT_ID};
pub use memory::MemoryModel;
pub use observable::{Observable, Subscription};
pub use path::{parse_path, Path, PathStep};
pub use scoped::ScopedModel;
pub use store::{same_store, ListenerGuard, ListenerId, ModelError, ModelStore};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
