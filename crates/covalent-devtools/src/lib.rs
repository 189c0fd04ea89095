//! Inspector sinks for the engine's diagnostic side-channel.
//!
//! [`LogInspector`] forwards every event to the `log` facade; [`Recorder`]
//! keeps them for later inspection (scope nesting audits, dispatch traces).
//! Neither changes engine behavior.

use std::cell::RefCell;
use std::rc::Rc;

use covalent_core::{Inspector, set_inspector};

/// Forwards every engine event to `log::debug!`.
#[derive(Default)]
pub struct LogInspector;

impl LogInspector {
    pub fn install() {
        set_inspector(Rc::new(LogInspector));
    }
}

impl Inspector for LogInspector {
    fn scope_enter(&self, scope: &str) {
        log::debug!("scope enter: {scope}");
    }

    fn scope_exit(&self, scope: &str) {
        log::debug!("scope exit: {scope}");
    }

    fn hook_resolved(&self, kind: &str, position: usize) {
        log::debug!("{kind} resolved at position {position}");
    }

    fn store_created(&self, store: &str, slot: usize) {
        log::debug!("store '{store}' created in slot {slot}");
    }

    fn dispatched(&self, store: &str) {
        log::debug!("store '{store}' dispatched");
    }

    fn selection_changed(&self, store: &str) {
        log::debug!("store '{store}' changed a consumer's selection");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    ScopeEnter(String),
    ScopeExit(String),
    HookResolved(String, usize),
    StoreCreated(String, usize),
    Dispatched(String),
    SelectionChanged(String),
}

/// Records engine events into a shared buffer. Clones share the buffer.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }

    /// Installs this recorder as the thread's inspector.
    pub fn install(&self) {
        set_inspector(Rc::new(self.clone()));
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Inspector for Recorder {
    fn scope_enter(&self, scope: &str) {
        self.events.borrow_mut().push(Event::ScopeEnter(scope.into()));
    }

    fn scope_exit(&self, scope: &str) {
        self.events.borrow_mut().push(Event::ScopeExit(scope.into()));
    }

    fn hook_resolved(&self, kind: &str, position: usize) {
        self.events.borrow_mut().push(Event::HookResolved(kind.into(), position));
    }

    fn store_created(&self, store: &str, slot: usize) {
        self.events.borrow_mut().push(Event::StoreCreated(store.into(), slot));
    }

    fn dispatched(&self, store: &str) {
        self.events.borrow_mut().push(Event::Dispatched(store.into()));
    }

    fn selection_changed(&self, store: &str) {
        self.events.borrow_mut().push(Event::SelectionChanged(store.into()));
    }
}

#[cfg(test)]
mod tests {
    use covalent_core::{Init, StoreRegistry, clear_inspector, create_shared_state};

    use crate::{Event, Recorder};

    #[test]
    fn test_recorder_orders_store_events() {
        let recorder = Recorder::new();
        recorder.install();

        let registry = StoreRegistry::new();
        let (_state, dispatch) = create_shared_state(Init::value(0i32), "traced");
        let store = dispatch.store_in(&registry);
        store.dispatcher().set(1);
        store.dispatcher().set(2);

        assert_eq!(
            recorder.events(),
            vec![
                Event::StoreCreated("traced".into(), 0),
                Event::Dispatched("traced".into()),
                Event::Dispatched("traced".into()),
            ]
        );
        recorder.clear();
        assert!(recorder.events().is_empty());
        clear_inspector();
    }
}
