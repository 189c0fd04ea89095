use std::cell::RefCell;
use std::rc::Rc;

use covalent_runtime::{Dispose, use_ref};

struct WatchedCell<D> {
    deps: Option<D>,
    cleanup: Option<Dispose>,
}

/// Synchronous counterpart of an effect cell: runs inline, in render
/// position, the moment `deps` changes, with the previous cleanup run first.
/// Subscription changes go through here because they must not wait for an
/// effect phase — a stale listener could be notified in the gap.
pub(crate) fn use_watched<D: PartialEq + 'static>(deps: D, f: impl FnOnce() -> Option<Dispose>) {
    let cell: Rc<RefCell<WatchedCell<D>>> = use_ref(|| WatchedCell { deps: None, cleanup: None });
    let mut cell = cell.borrow_mut();
    let changed = match &cell.deps {
        Some(held) => *held != deps,
        None => true,
    };
    if changed {
        if let Some(previous) = cell.cleanup.take() {
            previous.run();
        }
        cell.cleanup = f();
        cell.deps = Some(deps);
    }
}
