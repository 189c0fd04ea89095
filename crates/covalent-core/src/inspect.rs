use std::cell::RefCell;
use std::rc::Rc;

/// Diagnostic side-channel for external tooling. Events fire around scope
/// entry/exit, positional resolution, store creation, and store mutation;
/// none of them affect engine behavior. Every method defaults to a no-op so
/// sinks implement only what they care about.
pub trait Inspector {
    fn scope_enter(&self, _scope: &str) {}
    fn scope_exit(&self, _scope: &str) {}
    fn hook_resolved(&self, _kind: &str, _position: usize) {}
    fn store_created(&self, _store: &str, _slot: usize) {}
    fn dispatched(&self, _store: &str) {}
    fn selection_changed(&self, _store: &str) {}
}

thread_local! {
    static INSPECTOR: RefCell<Option<Rc<dyn Inspector>>> = const { RefCell::new(None) };
}

/// Installs `inspector` for the current thread, replacing any previous one.
pub fn set_inspector(inspector: Rc<dyn Inspector>) {
    INSPECTOR.with(|i| *i.borrow_mut() = Some(inspector));
}

pub fn clear_inspector() {
    INSPECTOR.with(|i| *i.borrow_mut() = None);
}

pub(crate) fn emit(f: impl FnOnce(&dyn Inspector)) {
    let installed = INSPECTOR.with(|i| i.borrow().clone());
    if let Some(inspector) = installed {
        f(&*inspector);
    }
}
