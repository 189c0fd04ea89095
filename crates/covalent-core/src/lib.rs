//! # Shared state and stable call identity for composable hooks
//!
//! Host-runtime cells are keyed to one composition and die with it. This
//! crate adds the other kind of state: values addressed by *what* is asking
//! (a builder's token, a call position inside a shared scope) rather than
//! *which consumer* is asking, so unrelated consumers can read and write the
//! same cell, subscribe to slices of it, and compose reusable stateful hooks
//! whose internals persist across all call sites.
//!
//! Three layers:
//!
//! - [`StoreRegistry`] — the slot table a consumer subtree shares, made
//!   ambient with [`with_registry`] (a thread default is used otherwise).
//! - [`create_shared_state`] / [`create_shared_reducer`] / [`create_shared_ref`]
//!   — builders returning hooks bound to one lazily-allocated store per
//!   registry, with selector/equality/throttle-gated subscriptions.
//! - [`create_common_hook`] + the `use_common_*` positional hooks — composable
//!   hooks owning a private scope, so nested positional calls get stable,
//!   collision-free cells regardless of which consumer calls them.
//!
//! ## Shared state
//!
//! ```rust
//! use covalent_core::{Init, StoreRegistry, create_shared_state, with_registry};
//! use covalent_runtime::Composition;
//!
//! let (count, set_count) = create_shared_state(Init::value(0i32), "counter");
//!
//! let registry = StoreRegistry::new();
//! let label = with_registry(&registry, || {
//!     let count = count.clone();
//!     Composition::mount(move || format!("count = {}", count.get()))
//! });
//! assert_eq!(label.value(), "count = 0");
//!
//! // Dispatch from anywhere; only consumers whose selection changed recompose.
//! set_count.store_in(&registry).dispatcher().set(5);
//! assert_eq!(label.value(), "count = 5");
//! ```
//!
//! ## Common hooks
//!
//! A common hook's internal state belongs to the hook definition, not to any
//! one caller:
//!
//! ```rust
//! use covalent_core::{Init, create_common_hook, use_common_ref, use_common_state};
//! use covalent_runtime::Composition;
//!
//! let use_counter = create_common_hook("use_counter", |(): ()| {
//!     let (count, set_count) = use_common_state(|| Init::value(0i32));
//!     let peak = use_common_ref(|| 0i32);
//!     if *count > *peak.borrow() {
//!         *peak.borrow_mut() = *count;
//!     }
//!     (*count, set_count)
//! });
//!
//! let a = {
//!     let h = use_counter.clone();
//!     Composition::mount(move || h.invoke())
//! };
//! let b = {
//!     let h = use_counter.clone();
//!     Composition::mount(move || h.invoke())
//! };
//! a.value().1.set(3);
//! assert_eq!(a.value().0, 3);
//! assert_eq!(b.value().0, 3);
//! ```
//!
//! Positional calls follow the host runtime's ordering rule, extended across
//! consumers: position N of a scope must mean the same call on every
//! invocation, so no conditional or loop-dependent positional hooks.
//!
//! Everything here is single-threaded and synchronous: dispatch applies the
//! action and notifies listeners before it returns, and there is no internal
//! batching — what the host coalesces into one frame is the host's business.

pub mod common;
pub mod common_hook;
pub mod error;
pub mod factory;
pub mod inspect;
pub mod registry;
pub mod scope;
pub mod shared;
pub mod store;
mod watched;

pub use common::*;
pub use common_hook::{CommonHook, create_common_hook};
pub use error::EngineError;
pub use factory::{positional_slot, try_positional_slot};
pub use inspect::{Inspector, clear_inspector, set_inspector};
pub use registry::{StoreRegistry, Token, ambient_registry, default_registry, with_registry};
pub use scope::Scope;
pub use shared::{
    Selector, SharedDispatcher, SharedRef, SharedSelector, ThrottleFn, create_shared_reducer,
    create_shared_ref, create_shared_state,
};
pub use store::{Dispatch, Init, Listener, ListenerKey, SetState, Store};
