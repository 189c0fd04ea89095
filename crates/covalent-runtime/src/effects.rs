use std::cell::RefCell;
use std::rc::Rc;

use crate::composition::{self, Phase};

#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        if let Some(f) = self.0.borrow_mut().take() {
            f()
        }
    }
}

pub(crate) trait EffectSlot {
    fn teardown(&self);
}

struct EffectCell<D> {
    deps: RefCell<Option<D>>,
    cleanup: RefCell<Option<Dispose>>,
}

impl<D> EffectSlot for EffectCell<D> {
    fn teardown(&self) {
        if let Some(cleanup) = self.cleanup.borrow_mut().take() {
            cleanup.run()
        }
    }
}

fn use_effect_in<D: PartialEq + 'static>(
    phase: Phase,
    hook: &'static str,
    deps: D,
    f: impl FnOnce() -> Option<Dispose> + 'static,
) {
    composition::with_current(hook, |c| {
        let mut created = false;
        let cell = composition::slot_in(c, hook, || {
            created = true;
            EffectCell { deps: RefCell::new(None::<D>), cleanup: RefCell::new(None) }
        });
        if created {
            c.register_effect(cell.clone());
        }
        let pending: Box<dyn FnOnce()> = Box::new(move || {
            let changed = match &*cell.deps.borrow() {
                Some(held) => *held != deps,
                None => true,
            };
            if changed {
                if let Some(previous) = cell.cleanup.borrow_mut().take() {
                    previous.run();
                }
                let next = f();
                *cell.cleanup.borrow_mut() = next;
                *cell.deps.borrow_mut() = Some(deps);
            }
        });
        c.enqueue(phase, pending);
    })
}

/// Synchronous phase: flushed right after the composition function returns,
/// before the pass is observable ("pre-paint"). The previous cleanup runs
/// before re-running; the last cleanup runs at unmount.
pub fn use_layout_effect<D: PartialEq + 'static>(deps: D, f: impl FnOnce() -> Option<Dispose> + 'static) {
    use_effect_in(Phase::Layout, "use_layout_effect", deps, f)
}

/// Passive phase: flushed after the layout phase at the end of the same
/// update cycle. Same cleanup contract as [`use_layout_effect`].
pub fn use_effect<D: PartialEq + 'static>(deps: D, f: impl FnOnce() -> Option<Dispose> + 'static) {
    use_effect_in(Phase::Passive, "use_effect", deps, f)
}
