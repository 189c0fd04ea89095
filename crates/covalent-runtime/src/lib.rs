//! # Compositions, cells, and effects
//!
//! A minimal, headless rendition of the hook contract a compose-style UI
//! runtime hands to its widgets. There is no widget tree and no painter here,
//! only the three pieces a stateful hook library needs from its host:
//!
//! - `Composition` — one mounted consumer function, re-run on invalidation.
//! - `use_state` / `use_ref` / `use_memo` — slot-addressed cells, resolved by
//!   call order within the owning composition.
//! - `use_layout_effect` / `use_effect` — deferred side-effects with cleanup,
//!   flushed in two phases after each composition pass.
//!
//! ## Compositions
//!
//! `Composition::mount` runs the function once and keeps it; setters returned
//! by `use_state` re-run exactly that composition:
//!
//! ```rust
//! use covalent_runtime::{Composition, use_state};
//!
//! let counter = Composition::mount(|| {
//!     let (count, set_count) = use_state(|| 0);
//!     (count, set_count)
//! });
//!
//! assert_eq!(counter.value().0, 0);
//! counter.value().1.set(3);
//! assert_eq!(counter.value().0, 3);
//! assert_eq!(counter.recompositions(), 2);
//! ```
//!
//! Cells are order-based: the Nth cell call in a pass always refers to the
//! Nth stored slot, so cell calls must not move between branches across
//! passes. A slot whose type changes is replaced with a warning.
//!
//! ## Effect phases
//!
//! `use_layout_effect` flushes synchronously right after the composition
//! function returns ("pre-paint"); `use_effect` flushes after the layout
//! phase at the end of the same update cycle. Both run their previous cleanup
//! before re-running and their final cleanup at unmount:
//!
//! ```rust
//! use covalent_runtime::{Composition, Dispose, use_layout_effect};
//!
//! let c = Composition::mount(|| {
//!     use_layout_effect((), || {
//!         log::info!("attached");
//!         Some(Dispose::new(|| log::info!("detached")))
//!     });
//! });
//! c.unmount();
//! ```
//!
//! ## Ambient locals
//!
//! `with_local` / `current_local` generalize composition locals: a value is
//! visible to every call nested under the `with_local` frame. A composition
//! captures the frames active at mount time and reinstates them around every
//! later pass, so an invalidation arriving from outside the frame still sees
//! the environment the consumer was mounted under.

pub mod composition;
pub mod effects;
pub mod locals;
pub mod tests;

pub use composition::{Composition, Setter, use_memo, use_ref, use_state};
pub use effects::{Dispose, use_effect, use_layout_effect};
pub use locals::{Snapshot, capture, current_local, with_local};
