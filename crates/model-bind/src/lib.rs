//! Bridges component-local reactive state to a shared JSON model, and ties
//! rendering-root lifetimes to host component destruction.
//!
//! Two independent pieces:
//!
//! - [`StateBinding`]: a per-component bridge that mirrors one model path
//!   into an observable value and hands out a `(value, setter)` pair on
//!   every render.
//! - [`mount`]: creates a rendering root inside a host-owned container and
//!   guarantees it unmounts exactly once, on host destruction or on manual
//!   teardown, whichever comes first.

pub mod bind;
pub mod mount;

pub use bind::{BoundState, Setter, StateBinding};
pub use mount::{mount, HostComponent, Mounted, Renderer, RenderRoot};
