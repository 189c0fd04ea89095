use std::rc::Rc;

use crate::error::EngineError;
use crate::inspect;
use crate::registry::ambient_registry;

/// The positional-hook primitive: consumes the next call position of the
/// currently executing scope and returns its cell, creating it on first
/// resolution. This is the supported way to define new shared hook kinds.
///
/// Position N is stable across invocations only while the scope performs the
/// same positional calls in the same order — conditional or loop-dependent
/// calls make positions resolve to the wrong cell.
pub fn try_positional_slot<T: 'static>(
    kind: &'static str,
    init: impl FnOnce() -> T,
) -> Result<Rc<T>, EngineError> {
    let registry = ambient_registry();
    let Some(scope) = registry.current_scope() else {
        return Err(EngineError::MissingScope { hook: kind });
    };
    inspect::emit(|i| i.hook_resolved(kind, scope.pointer()));
    Ok(scope.next_position(kind, init))
}

/// Panicking form of [`try_positional_slot`]; calling a positional hook with
/// no active scope is a programming error.
pub fn positional_slot<T: 'static>(kind: &'static str, init: impl FnOnce() -> T) -> Rc<T> {
    match try_positional_slot(kind, init) {
        Ok(cell) => cell,
        Err(error) => panic!("{error}"),
    }
}
