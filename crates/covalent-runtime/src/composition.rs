use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::effects::EffectSlot;
use crate::locals;

thread_local! {
    static ACTIVE: RefCell<Vec<Rc<CompositionInner>>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Layout,
    Passive,
}

pub(crate) struct CompositionInner {
    body: RefCell<Option<Box<dyn FnMut()>>>,
    slots: RefCell<Vec<Rc<dyn Any>>>,
    cursor: Cell<usize>,
    alive: Cell<bool>,
    composing: Cell<bool>,
    dirty: Cell<bool>,
    recompositions: Cell<usize>,
    captured: locals::Snapshot,
    layout_queue: RefCell<Vec<Box<dyn FnOnce()>>>,
    passive_queue: RefCell<Vec<Box<dyn FnOnce()>>>,
    effects: RefCell<Vec<Rc<dyn EffectSlot>>>,
}

impl CompositionInner {
    pub(crate) fn enqueue(&self, phase: Phase, op: Box<dyn FnOnce()>) {
        match phase {
            Phase::Layout => self.layout_queue.borrow_mut().push(op),
            Phase::Passive => self.passive_queue.borrow_mut().push(op),
        }
    }

    pub(crate) fn register_effect(&self, slot: Rc<dyn EffectSlot>) {
        self.effects.borrow_mut().push(slot);
    }

    fn flush(&self, phase: Phase) {
        let pending = match phase {
            Phase::Layout => std::mem::take(&mut *self.layout_queue.borrow_mut()),
            Phase::Passive => std::mem::take(&mut *self.passive_queue.borrow_mut()),
        };
        for op in pending {
            op();
        }
    }
}

/// One mounted consumer function. Holds its slot table for the lifetime of
/// the mount; `use_state` setters re-run exactly this composition.
pub struct Composition<R: 'static> {
    inner: Rc<CompositionInner>,
    result: Rc<RefCell<Option<R>>>,
}

impl<R: 'static> Composition<R> {
    /// Runs `f` once and keeps it for later passes. Ambient locals active
    /// right now are captured and reinstated around every later pass.
    pub fn mount(mut f: impl FnMut() -> R + 'static) -> Self {
        let inner = Rc::new(CompositionInner {
            body: RefCell::new(None),
            slots: RefCell::new(Vec::new()),
            cursor: Cell::new(0),
            alive: Cell::new(true),
            composing: Cell::new(false),
            dirty: Cell::new(false),
            recompositions: Cell::new(0),
            captured: locals::capture(),
            layout_queue: RefCell::new(Vec::new()),
            passive_queue: RefCell::new(Vec::new()),
            effects: RefCell::new(Vec::new()),
        });
        let result = Rc::new(RefCell::new(None));
        let sink = result.clone();
        *inner.body.borrow_mut() = Some(Box::new(move || {
            *sink.borrow_mut() = Some(f());
        }));
        compose(&inner);
        Composition { inner, result }
    }

    /// Re-runs the composition function, as the host would on a prop change.
    pub fn recompose(&self) {
        compose(&self.inner);
    }

    /// Permanent teardown: runs every effect cell's pending cleanup and
    /// detaches the body. Idempotent.
    pub fn unmount(&self) {
        if !self.inner.alive.get() {
            return;
        }
        self.inner.alive.set(false);
        let effects: Vec<Rc<dyn EffectSlot>> = self.inner.effects.borrow().clone();
        for slot in effects {
            slot.teardown();
        }
        self.inner.body.borrow_mut().take();
    }

    /// The value produced by the most recent pass.
    pub fn value(&self) -> R
    where
        R: Clone,
    {
        self.result
            .borrow()
            .as_ref()
            .expect("composition has not produced a value")
            .clone()
    }

    pub fn with_value<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(self
            .result
            .borrow()
            .as_ref()
            .expect("composition has not produced a value"))
    }

    /// Number of passes so far, the initial mount included.
    pub fn recompositions(&self) -> usize {
        self.inner.recompositions.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.alive.get()
    }
}

struct ActiveGuard;

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|s| {
            s.borrow_mut().pop();
        });
    }
}

fn compose(inner: &Rc<CompositionInner>) {
    if !inner.alive.get() {
        log::warn!("recompose requested on an unmounted composition; ignored");
        return;
    }
    if inner.composing.get() {
        // Invalidated mid-pass: run once more after the current pass.
        inner.dirty.set(true);
        return;
    }
    inner.composing.set(true);
    loop {
        inner.dirty.set(false);
        let Some(mut body) = inner.body.borrow_mut().take() else {
            break;
        };
        {
            let _locals = locals::reinstate(&inner.captured);
            ACTIVE.with(|s| s.borrow_mut().push(inner.clone()));
            let _active = ActiveGuard;
            inner.cursor.set(0);
            body();
        }
        *inner.body.borrow_mut() = Some(body);
        inner.flush(Phase::Layout);
        inner.recompositions.set(inner.recompositions.get() + 1);
        inner.flush(Phase::Passive);
        if !inner.dirty.get() {
            break;
        }
    }
    inner.composing.set(false);
}

pub(crate) fn with_current<T>(hook: &str, f: impl FnOnce(&Rc<CompositionInner>) -> T) -> T {
    let current = ACTIVE.with(|s| s.borrow().last().cloned());
    match current {
        Some(c) => f(&c),
        None => panic!("{hook} called outside of an active composition"),
    }
}

/// Slot-based cell resolution (sequential composition only).
pub(crate) fn slot_in<T: 'static>(
    c: &Rc<CompositionInner>,
    hook: &'static str,
    init: impl FnOnce() -> T,
) -> Rc<T> {
    let index = c.cursor.get();
    c.cursor.set(index + 1);
    let mut slots = c.slots.borrow_mut();
    if index < slots.len() {
        match slots[index].clone().downcast::<T>() {
            Ok(cell) => cell,
            Err(_) => {
                log::warn!("{hook}: slot {index} changed type between passes; replacing");
                let cell = Rc::new(init());
                slots[index] = cell.clone();
                cell
            }
        }
    } else {
        debug_assert_eq!(index, slots.len());
        let cell = Rc::new(init());
        slots.push(cell.clone());
        cell
    }
}

struct StateCell<T> {
    value: RefCell<T>,
    owner: Weak<CompositionInner>,
}

/// Writes the cell and re-runs the owning composition. Cloneable; identity is
/// stable for the life of the cell.
pub struct Setter<T: 'static> {
    cell: Rc<StateCell<T>>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Setter { cell: self.cell.clone() }
    }
}

impl<T: 'static> Setter<T> {
    pub fn set(&self, value: T) {
        *self.cell.value.borrow_mut() = value;
        self.invalidate();
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.cell.value.borrow());
        *self.cell.value.borrow_mut() = next;
        self.invalidate();
    }

    fn invalidate(&self) {
        match self.cell.owner.upgrade() {
            Some(owner) => compose(&owner),
            None => log::warn!("state written after its composition was dropped; ignored"),
        }
    }
}

/// State cell: `(current value, setter)`. Setting triggers exactly one pass
/// of the owning composition.
pub fn use_state<T: Clone + 'static>(init: impl FnOnce() -> T) -> (T, Setter<T>) {
    let cell = with_current("use_state", |c| {
        let owner = Rc::downgrade(c);
        slot_in(c, "use_state", move || StateCell { value: RefCell::new(init()), owner })
    });
    let value = cell.value.borrow().clone();
    (value, Setter { cell })
}

/// Mutable container surviving passes without triggering them.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    with_current("use_ref", |c| slot_in(c, "use_ref", || RefCell::new(init())))
}

/// Recomputes only when `deps` changes; stable `Rc` identity otherwise.
pub fn use_memo<T: 'static, D: PartialEq + 'static>(deps: D, compute: impl FnOnce() -> T) -> Rc<T> {
    let cell = with_current("use_memo", |c| {
        slot_in(c, "use_memo", || RefCell::new(None::<(D, Rc<T>)>))
    });
    let mut slot = cell.borrow_mut();
    match &*slot {
        Some((held, value)) if *held == deps => value.clone(),
        _ => {
            let value = Rc::new(compute());
            *slot = Some((deps, value.clone()));
            value
        }
    }
}
