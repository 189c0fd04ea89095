use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use covalent_runtime::{Dispose, use_effect, use_ref, use_state};

use crate::inspect;
use crate::registry::{StoreRegistry, Token, ambient_registry};
use crate::store::{Apply, Dispatch, Init, Listener, ListenerKey, SetState, Store};
use crate::watched::use_watched;

/// Throttle ("time variation") wrapper: receives the comparison-and-update
/// listener and returns the listener actually registered with the store. The
/// returned listener sees every notification and decides which to forward;
/// without a throttle, every notification is forwarded.
pub type ThrottleFn<S> = Rc<dyn Fn(Listener<S>) -> Listener<S>>;

/// How one call site selects out of a store: a selector function, an equality
/// function gating updates, and an optional throttle. All three are `Rc`s so
/// their identities are well-defined: a call site re-subscribes (stale
/// listener removed first, synchronously) whenever any identity changes
/// between passes. Build one once and reuse it; constructing a `Selector`
/// inline on every pass re-subscribes on every pass.
pub struct Selector<S: 'static, Sel: 'static> {
    select: Rc<dyn Fn(&Rc<S>) -> Sel>,
    equal: Rc<dyn Fn(&Sel, &Sel) -> bool>,
    throttle: Option<ThrottleFn<S>>,
}

impl<S, Sel> Clone for Selector<S, Sel> {
    fn clone(&self) -> Self {
        Selector {
            select: self.select.clone(),
            equal: self.equal.clone(),
            throttle: self.throttle.clone(),
        }
    }
}

impl<S: 'static, Sel: 'static> Selector<S, Sel> {
    /// Selector with the default equality (`==` on the selected value).
    pub fn new(select: impl Fn(&Rc<S>) -> Sel + 'static) -> Self
    where
        Sel: PartialEq,
    {
        Selector::by(select, |a, b| a == b)
    }

    /// Selector with an explicit equality function.
    pub fn by(
        select: impl Fn(&Rc<S>) -> Sel + 'static,
        equal: impl Fn(&Sel, &Sel) -> bool + 'static,
    ) -> Self {
        Selector {
            select: Rc::new(select),
            equal: Rc::new(equal),
            throttle: None,
        }
    }

    pub fn with_throttle(mut self, throttle: impl Fn(Listener<S>) -> Listener<S> + 'static) -> Self {
        self.throttle = Some(Rc::new(throttle));
        self
    }

    fn identity_key(&self) -> (usize, usize, usize) {
        (
            Rc::as_ptr(&self.select) as *const () as usize,
            Rc::as_ptr(&self.equal) as *const () as usize,
            self.throttle.as_ref().map_or(0, |t| Rc::as_ptr(t) as *const () as usize),
        )
    }
}

struct SharedCore<S: 'static, A: 'static> {
    token: Token,
    name: &'static str,
    apply: Apply<S, A>,
    init: Init<S, A>,
    identity: OnceCell<Selector<S, Rc<S>>>,
}

impl<S: 'static, A: 'static> SharedCore<S, A> {
    fn store_in(&self, registry: &StoreRegistry) -> Store<S, A> {
        registry.resolve_store(self.token, |hydrated| {
            Store::new(self.name, self.apply.clone(), self.init.clone(), hydrated)
        })
    }

    // Cached so `get()` keeps one listener per call site instead of
    // re-subscribing every pass.
    fn identity_selector(&self) -> &Selector<S, Rc<S>> {
        self.identity
            .get_or_init(|| Selector::by(|state: &Rc<S>| state.clone(), |a, b| Rc::ptr_eq(a, b)))
    }
}

/// The selector half of a shared-state pair. See [`create_shared_reducer`].
pub struct SharedSelector<S: 'static, A: 'static = SetState<S>> {
    core: Rc<SharedCore<S, A>>,
}

/// The dispatch half of a shared-state pair. See [`create_shared_reducer`].
pub struct SharedDispatcher<S: 'static, A: 'static = SetState<S>> {
    core: Rc<SharedCore<S, A>>,
}

impl<S, A> Clone for SharedSelector<S, A> {
    fn clone(&self) -> Self {
        SharedSelector { core: self.core.clone() }
    }
}

impl<S, A> Clone for SharedDispatcher<S, A> {
    fn clone(&self) -> Self {
        SharedDispatcher { core: self.core.clone() }
    }
}

/// Builds a shared, reducer-driven state: returns a paired selector hook and
/// dispatch hook bound to one store. The pair shares a single construction
/// token, so both halves resolve to the same store per registry; the store
/// itself is allocated lazily on first use.
pub fn create_shared_reducer<S: 'static, A: 'static>(
    reducer: impl Fn(&Rc<S>, A) -> Rc<S> + 'static,
    init: Init<S, A>,
    name: &'static str,
) -> (SharedSelector<S, A>, SharedDispatcher<S, A>) {
    let core = Rc::new(SharedCore {
        token: Token::unique(),
        name,
        apply: Rc::new(reducer),
        init,
        identity: OnceCell::new(),
    });
    (SharedSelector { core: core.clone() }, SharedDispatcher { core })
}

/// Reducerless specialization: the action *is* the next state (or a function
/// of the current one) — `setState` semantics over [`SetState`].
pub fn create_shared_state<S: 'static>(
    init: Init<S>,
    name: &'static str,
) -> (SharedSelector<S>, SharedDispatcher<S>) {
    create_shared_reducer(|state, action: SetState<S>| action.apply(state), init, name)
}

impl<S: 'static, A: 'static> SharedSelector<S, A> {
    /// Hook: subscribe this call site to the whole state. Updates are gated
    /// by state identity, so a reducer returning its input unchanged causes
    /// no recomposition.
    pub fn get(&self) -> Rc<S> {
        self.select(self.core.identity_selector())
    }

    /// Hook: subscribe this call site through `selector`. Returns only the
    /// selected value; the consumer recomposes after a dispatch iff the
    /// freshly selected value fails the selector's equality test against the
    /// previous one.
    pub fn select<Sel: Clone + 'static>(&self, selector: &Selector<S, Sel>) -> Sel {
        let registry = ambient_registry();
        let store = self.core.store_in(&registry);
        let selected: Rc<RefCell<Sel>> = use_ref(|| (selector.select)(&store.state()));
        let (_epoch, bump) = use_state(|| 0u64);
        let subscription: Rc<RefCell<Option<(Store<S, A>, ListenerKey)>>> = use_ref(|| None);

        let deps = (store.id(), selector.identity_key());
        use_watched(deps, {
            let name = self.core.name;
            let store = store.clone();
            let selected = selected.clone();
            let subscription = subscription.clone();
            let select = selector.select.clone();
            let equal = selector.equal.clone();
            let throttle = selector.throttle.clone();
            move || {
                let base: Listener<S> = Rc::new({
                    let selected = selected.clone();
                    move |state: &Rc<S>| {
                        let next = (select)(state);
                        let changed = !(equal)(&selected.borrow(), &next);
                        if changed {
                            // Updated in place; the epoch bump is what makes
                            // the owning composition re-read it.
                            *selected.borrow_mut() = next;
                            inspect::emit(|i| i.selection_changed(name));
                            bump.update(|n| n + 1);
                        }
                    }
                });
                let listener = match &throttle {
                    Some(throttle) => throttle(base),
                    None => base,
                };
                let key = store.subscribe(listener);
                *subscription.borrow_mut() = Some((store.clone(), key));
                Some(Dispose::new({
                    let subscription = subscription.clone();
                    move || {
                        if let Some((store, key)) = subscription.borrow_mut().take() {
                            store.unsubscribe(key);
                        }
                    }
                }))
            }
        });
        // Unconditional removal at unmount, on top of the synchronous
        // re-subscription above.
        use_effect((), {
            let subscription = subscription.clone();
            move || {
                Some(Dispose::new(move || {
                    if let Some((store, key)) = subscription.borrow_mut().take() {
                        store.unsubscribe(key);
                    }
                }))
            }
        });
        let value = selected.borrow().clone();
        value
    }

    /// The backing store in `registry`, resolving (and creating) it if needed.
    pub fn store_in(&self, registry: &StoreRegistry) -> Store<S, A> {
        self.core.store_in(registry)
    }

    pub fn name(&self) -> &'static str {
        self.core.name
    }
}

impl<S: 'static, A: 'static> SharedDispatcher<S, A> {
    /// Hook: the store's dispatch handle. Identity never changes for the
    /// store's lifetime.
    pub fn get(&self) -> Dispatch<S, A> {
        self.core.store_in(&ambient_registry()).dispatcher()
    }

    /// The backing store in `registry`, resolving (and creating) it if needed.
    pub fn store_in(&self, registry: &StoreRegistry) -> Store<S, A> {
        self.core.store_in(registry)
    }

    pub fn name(&self) -> &'static str {
        self.core.name
    }
}

/// A shared mutable cell: one `Rc<RefCell<T>>` per registry under this
/// builder's token. Reads and writes never trigger recomposition.
pub struct SharedRef<T: 'static> {
    token: Token,
    name: &'static str,
    init: Rc<dyn Fn() -> T>,
}

impl<T> Clone for SharedRef<T> {
    fn clone(&self) -> Self {
        SharedRef {
            token: self.token,
            name: self.name,
            init: self.init.clone(),
        }
    }
}

pub fn create_shared_ref<T: 'static>(init: impl Fn() -> T + 'static, name: &'static str) -> SharedRef<T> {
    SharedRef {
        token: Token::unique(),
        name,
        init: Rc::new(init),
    }
}

impl<T: 'static> SharedRef<T> {
    /// Hook: the cell in the ambient registry; every call site sees the same
    /// `Rc`.
    pub fn get(&self) -> Rc<RefCell<T>> {
        self.get_in(&ambient_registry())
    }

    pub fn get_in(&self, registry: &StoreRegistry) -> Rc<RefCell<T>> {
        let init = self.init.clone();
        registry.resolve_cell(self.token, self.name, move || RefCell::new(init()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
