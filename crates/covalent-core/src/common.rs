use std::cell::{Cell, RefCell};
use std::rc::Rc;

use covalent_runtime::{Dispose, use_effect, use_layout_effect, use_ref};

use crate::factory::positional_slot;
use crate::shared::{SharedDispatcher, SharedSelector, create_shared_state};
use crate::store::{Dispatch, Init, SetState};

/// Positional ref: one mutable cell per call position, shared by every
/// consumer reaching that position. The initializer is consumed by the first
/// call ever to resolve the position; later initializers are ignored.
pub fn use_common_ref<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    positional_slot("use_common_ref", || RefCell::new(init()))
}

/// Positional memo: recomputes only when the watched `deps` value changes,
/// compared with `==`. The memoized value is shared by every call site.
pub fn use_common_memo<T: 'static, D: PartialEq + 'static>(
    deps: D,
    compute: impl FnOnce() -> T,
) -> Rc<T> {
    let cell = positional_slot("use_common_memo", || RefCell::new(None::<(D, Rc<T>)>));
    let mut held = cell.borrow_mut();
    match &*held {
        Some((watched, value)) if *watched == deps => value.clone(),
        _ => {
            let value = Rc::new(compute());
            *held = Some((deps, value.clone()));
            value
        }
    }
}

/// Positional callback: stable shared identity until `deps` changes.
pub fn use_common_callback<Args: 'static, R: 'static, D: PartialEq + 'static>(
    deps: D,
    callback: impl Fn(Args) -> R + 'static,
) -> Rc<dyn Fn(Args) -> R> {
    let cell = positional_slot(
        "use_common_callback",
        || RefCell::new(None::<(D, Rc<dyn Fn(Args) -> R>)>),
    );
    let mut held = cell.borrow_mut();
    match &*held {
        Some((watched, value)) if *watched == deps => value.clone(),
        _ => {
            let value: Rc<dyn Fn(Args) -> R> = Rc::new(callback);
            *held = Some((deps, value.clone()));
            value
        }
    }
}

/// Positional shared state: a full selector/dispatch pair allocated lazily at
/// the call position, so every consumer reaching it reads and writes the same
/// store. The initial value comes from the first call.
pub fn use_common_state<S: 'static>(
    init: impl FnOnce() -> Init<S>,
) -> (Rc<S>, Dispatch<S, SetState<S>>) {
    let pair: Rc<(SharedSelector<S>, SharedDispatcher<S>)> =
        positional_slot("use_common_state", || create_shared_state(init(), "use_common_state"));
    (pair.0.get(), pair.1.get())
}

struct SharedEffectCell<D> {
    watched: RefCell<Option<D>>,
    cleanup: RefCell<Option<Dispose>>,
    active: Cell<usize>,
}

fn use_common_effect_in<D: PartialEq + Clone + 'static>(
    kind: &'static str,
    layout: bool,
    deps: D,
    effect: impl FnOnce() -> Option<Dispose> + 'static,
) {
    let cell = positional_slot(kind, || SharedEffectCell {
        watched: RefCell::new(None::<D>),
        cleanup: RefCell::new(None),
        active: Cell::new(0),
    });
    // Pass-local flag; only this consumer's activation effect may set it, and
    // only on the flush where it pushes the activation count to one.
    let first_activation = use_ref(|| false);
    *first_activation.borrow_mut() = false;

    let tracker = {
        let cell = cell.clone();
        let first_activation = first_activation.clone();
        move || {
            cell.active.set(cell.active.get() + 1);
            *first_activation.borrow_mut() = cell.active.get() == 1;
            Some(Dispose::new({
                let cell = cell.clone();
                move || {
                    cell.active.set(cell.active.get() - 1);
                    // Zero-crossing: the last consumer sharing the position
                    // deactivated.
                    if cell.active.get() == 0
                        && let Some(last) = cell.cleanup.borrow_mut().take()
                    {
                        last.run();
                    }
                }
            }))
        }
    };
    let runner = {
        let cell = cell.clone();
        let first_activation = first_activation.clone();
        let deps = deps.clone();
        move || {
            let changed = {
                let watched = cell.watched.borrow();
                watched.is_none() || *first_activation.borrow() || watched.as_ref() != Some(&deps)
            };
            if changed {
                *cell.watched.borrow_mut() = Some(deps);
                if let Some(previous) = cell.cleanup.borrow_mut().take() {
                    previous.run();
                }
                *cell.cleanup.borrow_mut() = effect();
            }
            None
        }
    };
    if layout {
        use_layout_effect((), tracker);
        use_layout_effect(deps, runner);
    } else {
        use_effect((), tracker);
        use_effect(deps, runner);
    }
}

/// Positional layout effect shared across consumers: the callback runs on the
/// first activation anywhere or on a `deps` change, with the previous cleanup
/// run first; the final cleanup runs only when the last consumer sharing the
/// position deactivates (activation-counted, not per consumer).
pub fn use_common_layout_effect<D: PartialEq + Clone + 'static>(
    deps: D,
    effect: impl FnOnce() -> Option<Dispose> + 'static,
) {
    use_common_effect_in("use_common_layout_effect", true, deps, effect)
}

/// Passive-phase twin of [`use_common_layout_effect`].
pub fn use_common_effect<D: PartialEq + Clone + 'static>(
    deps: D,
    effect: impl FnOnce() -> Option<Dispose> + 'static,
) {
    use_common_effect_in("use_common_effect", false, deps, effect)
}
