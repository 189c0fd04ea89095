use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use covalent_runtime::{current_local, with_local};

use crate::inspect;
use crate::scope::Scope;
use crate::store::Store;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque identity minted once per builder construction (not per call site).
/// Everything a builder allocates in a registry is keyed under its token, so
/// resolving the same token twice always yields the same object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Token(u64);

impl Token {
    pub fn unique() -> Token {
        Token(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

enum NamedSlot {
    Index(usize),
    Cell(Rc<dyn Any>),
}

/// The shared slot table of one consumer subtree: dense store slots, a token
/// map, an allocation counter, and the currently executing scope. Cloning is
/// shallow; all clones address the same table.
///
/// Single-threaded by construction, like the rest of the engine: a registry
/// must only ever be touched from the thread that drives its compositions.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    inner: Rc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    slots: RefCell<Vec<Option<Rc<dyn Any>>>>,
    named: RefCell<HashMap<Token, NamedSlot>>,
    next_index: Cell<usize>,
    current_scope: RefCell<Option<Rc<Scope>>>,
}

impl StoreRegistry {
    pub fn new() -> StoreRegistry {
        StoreRegistry::default()
    }

    /// Dense slots allocated so far (stores plus seeded values).
    pub fn allocated(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    /// True if both handles address the same slot table.
    pub fn same(&self, other: &StoreRegistry) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Pre-populates a dense slot with a raw value. When a store later
    /// resolves to that index, the seeded value becomes its initial state and
    /// the builder's initializer is skipped. Indexes are handed out in builder
    /// first-use order, so seeding is only predictable when performed before
    /// the first composition against this registry (state hydration).
    pub fn seed<S: 'static>(&self, index: usize, value: S) {
        let mut slots = self.inner.slots.borrow_mut();
        if slots.len() <= index {
            slots.resize_with(index + 1, || None);
        }
        if slots[index].is_some() {
            log::warn!("seed: slot {index} already occupied; replacing");
        }
        slots[index] = Some(Rc::new(value));
    }

    pub(crate) fn resolve_cell<T: 'static>(
        &self,
        token: Token,
        label: &'static str,
        factory: impl FnOnce() -> T,
    ) -> Rc<T> {
        {
            let named = self.inner.named.borrow();
            match named.get(&token) {
                Some(NamedSlot::Cell(existing)) => {
                    if let Ok(cell) = existing.clone().downcast::<T>() {
                        return cell;
                    }
                    log::warn!("{label}: token re-registered with a different cell type; replacing");
                }
                Some(NamedSlot::Index(_)) => {
                    log::warn!("{label}: token already allocated as a store slot; replacing");
                }
                None => {}
            }
        }
        let cell = Rc::new(factory());
        self.inner
            .named
            .borrow_mut()
            .insert(token, NamedSlot::Cell(cell.clone()));
        cell
    }

    pub(crate) fn resolve_store<S: 'static, A: 'static>(
        &self,
        token: Token,
        make: impl FnOnce(Option<Rc<S>>) -> Store<S, A>,
    ) -> Store<S, A> {
        let registered = {
            let named = self.inner.named.borrow();
            match named.get(&token) {
                Some(NamedSlot::Index(i)) => Some(*i),
                Some(NamedSlot::Cell(_)) => {
                    log::warn!("store token was registered as a plain cell; reallocating");
                    None
                }
                None => None,
            }
        };
        let index = registered.unwrap_or_else(|| {
            let i = self.alloc_index();
            self.inner.named.borrow_mut().insert(token, NamedSlot::Index(i));
            i
        });
        let existing = self.inner.slots.borrow().get(index).cloned().flatten();
        if let Some(any) = existing.clone()
            && let Ok(store) = any.downcast::<Store<S, A>>()
        {
            return (*store).clone();
        }
        // Anything else sitting at the index is a seeded raw value: it wins
        // over the initializer (hydration).
        let hydrated = existing.and_then(|any| any.downcast::<S>().ok());
        let store = make(hydrated);
        {
            let mut slots = self.inner.slots.borrow_mut();
            if slots.len() <= index {
                slots.resize_with(index + 1, || None);
            }
            slots[index] = Some(Rc::new(store.clone()));
        }
        inspect::emit(|i| i.store_created(store.name(), index));
        store
    }

    fn alloc_index(&self) -> usize {
        let index = self.inner.next_index.get();
        self.inner.next_index.set(index + 1);
        index
    }

    /// The scope currently executing against this registry, if any.
    pub fn current_scope(&self) -> Option<Rc<Scope>> {
        self.inner.current_scope.borrow().clone()
    }

    pub(crate) fn swap_scope(&self, next: Option<Rc<Scope>>) -> Option<Rc<Scope>> {
        std::mem::replace(&mut *self.inner.current_scope.borrow_mut(), next)
    }
}

thread_local! {
    static DEFAULT: StoreRegistry = StoreRegistry::new();
}

/// The thread's default registry, used when no override frame is active.
pub fn default_registry() -> StoreRegistry {
    DEFAULT.with(|r| r.clone())
}

/// The registry ambient to the current call: the innermost [`with_registry`]
/// frame, or the thread default.
pub fn ambient_registry() -> StoreRegistry {
    current_local::<StoreRegistry>().unwrap_or_else(default_registry)
}

/// Makes `registry` ambient for every engine call nested in `f`. Compositions
/// mounted inside the frame keep it for all of their later passes.
pub fn with_registry<R>(registry: &StoreRegistry, f: impl FnOnce() -> R) -> R {
    with_local(registry.clone(), f)
}
