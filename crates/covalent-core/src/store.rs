use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::inspect;

new_key_type! {
    /// Handle to one registered listener; remove with it.
    pub struct ListenerKey;
}

/// A store notification callback; receives the post-dispatch state.
pub type Listener<S> = Rc<dyn Fn(&Rc<S>)>;

pub(crate) type Apply<S, A> = Rc<dyn Fn(&Rc<S>, A) -> Rc<S>>;

/// The action type of reducerless stores: replace the state wholesale, or
/// derive it from the current one. Returning the incoming `Rc` unchanged from
/// `With` keeps state identity and therefore suppresses consumer updates.
pub enum SetState<S: 'static> {
    Put(Rc<S>),
    With(Box<dyn FnOnce(&Rc<S>) -> Rc<S>>),
}

impl<S> SetState<S> {
    pub fn put(value: S) -> Self {
        SetState::Put(Rc::new(value))
    }

    pub fn put_shared(value: Rc<S>) -> Self {
        SetState::Put(value)
    }

    pub fn with(f: impl FnOnce(&Rc<S>) -> Rc<S> + 'static) -> Self {
        SetState::With(Box::new(f))
    }

    pub(crate) fn apply(self, state: &Rc<S>) -> Rc<S> {
        match self {
            SetState::Put(value) => value,
            SetState::With(f) => f(state),
        }
    }
}

/// Initial state of a store: a ready value, or a lazy initializer invoked
/// exactly once at store construction with that store's dispatch handle. The
/// lazy form exists so initialization can kick off asynchronous work that
/// later dispatches into the same store; a dispatch issued synchronously from
/// inside the initializer is ignored (the store does not exist yet).
pub enum Init<S: 'static, A: 'static = SetState<S>> {
    Value(Rc<S>),
    Lazy(Rc<dyn Fn(Dispatch<S, A>) -> S>),
}

impl<S, A> Init<S, A> {
    pub fn value(value: S) -> Self {
        Init::Value(Rc::new(value))
    }

    pub fn shared(value: Rc<S>) -> Self {
        Init::Value(value)
    }

    pub fn lazy(f: impl Fn(Dispatch<S, A>) -> S + 'static) -> Self {
        Init::Lazy(Rc::new(f))
    }
}

impl<S, A> Clone for Init<S, A> {
    fn clone(&self) -> Self {
        match self {
            Init::Value(v) => Init::Value(v.clone()),
            Init::Lazy(f) => Init::Lazy(f.clone()),
        }
    }
}

struct StoreInner<S: 'static, A: 'static> {
    name: &'static str,
    apply: Apply<S, A>,
    state: RefCell<Rc<S>>,
    listeners: RefCell<SlotMap<ListenerKey, Listener<S>>>,
}

/// One reducer-driven state cell plus its listener set. Created lazily per
/// registry, alive for the registry's lifetime. `dispatch` applies the action
/// and notifies every listener synchronously before returning.
pub struct Store<S: 'static, A: 'static = SetState<S>> {
    inner: Rc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Store { inner: self.inner.clone() }
    }
}

impl<S: 'static, A: 'static> Store<S, A> {
    pub(crate) fn new(
        name: &'static str,
        apply: Apply<S, A>,
        init: Init<S, A>,
        hydrated: Option<Rc<S>>,
    ) -> Store<S, A> {
        let inner = Rc::new_cyclic(|weak: &Weak<StoreInner<S, A>>| {
            let initial = match hydrated {
                Some(state) => state,
                None => match init {
                    Init::Value(value) => value,
                    Init::Lazy(f) => Rc::new(f(Dispatch { store: weak.clone() })),
                },
            };
            StoreInner {
                name,
                apply,
                state: RefCell::new(initial),
                listeners: RefCell::new(SlotMap::with_key()),
            }
        });
        Store { inner }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// The current state. Cheap; listeners receive the same `Rc`.
    pub fn state(&self) -> Rc<S> {
        self.inner.state.borrow().clone()
    }

    pub fn dispatch(&self, action: A) {
        dispatch_inner(&self.inner, action);
    }

    /// A dispatch handle whose identity is stable for the store's lifetime.
    pub fn dispatcher(&self) -> Dispatch<S, A> {
        Dispatch { store: Rc::downgrade(&self.inner) }
    }

    /// Currently registered listeners: one per mounted, actively subscribed
    /// call site.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub(crate) fn subscribe(&self, listener: Listener<S>) -> ListenerKey {
        self.inner.listeners.borrow_mut().insert(listener)
    }

    pub(crate) fn unsubscribe(&self, key: ListenerKey) {
        self.inner.listeners.borrow_mut().remove(key);
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

fn dispatch_inner<S: 'static, A: 'static>(inner: &Rc<StoreInner<S, A>>, action: A) {
    inspect::emit(|i| i.dispatched(inner.name));
    let previous = inner.state.borrow().clone();
    let next = (inner.apply)(&previous, action);
    *inner.state.borrow_mut() = next.clone();
    // Snapshot first: every listener active at dispatch time is visited
    // exactly once, even if one of them (re)subscribes while we notify.
    let listeners: Vec<Listener<S>> = inner.listeners.borrow().values().cloned().collect();
    for listener in listeners {
        listener(&next);
    }
}

/// Cloneable dispatch handle. Holds the store weakly so a handle escaping a
/// dropped registry (or a mid-construction lazy initializer) degrades to a
/// logged no-op instead of keeping the store alive.
pub struct Dispatch<S: 'static, A: 'static = SetState<S>> {
    store: Weak<StoreInner<S, A>>,
}

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Dispatch { store: self.store.clone() }
    }
}

impl<S: 'static, A: 'static> Dispatch<S, A> {
    pub fn call(&self, action: A) {
        match self.store.upgrade() {
            Some(inner) => dispatch_inner(&inner, action),
            None => log::warn!("dispatch ignored: store dropped or not yet constructed"),
        }
    }

    pub fn same_store(&self, other: &Dispatch<S, A>) -> bool {
        Weak::ptr_eq(&self.store, &other.store)
    }
}

impl<S, A> PartialEq for Dispatch<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.same_store(other)
    }
}

impl<S: 'static> Dispatch<S, SetState<S>> {
    /// "setState" shorthand: replace the state wholesale.
    pub fn set(&self, value: S) {
        self.call(SetState::put(value));
    }

    /// Functional form; receives the current state.
    pub fn set_with(&self, f: impl FnOnce(&Rc<S>) -> Rc<S> + 'static) {
        self.call(SetState::with(f));
    }
}
