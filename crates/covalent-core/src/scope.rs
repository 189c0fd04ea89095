use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;

struct Position {
    kind: &'static str,
    cell: Rc<dyn Any>,
}

/// The positional-call-tracking context of one common hook: an ordered table
/// of resolved call positions plus a cursor reset at the start of every
/// invocation. Lives as long as its registry; never torn down.
///
/// The Nth positional call during any invocation resolves to the Nth entry,
/// provided call count and order are unchanged between invocations — the host
/// runtime's own cell-ordering rule, extended across consumers.
pub struct Scope {
    name: &'static str,
    positions: RefCell<SmallVec<[Position; 8]>>,
    pointer: Cell<usize>,
}

impl Scope {
    pub(crate) fn new(name: &'static str) -> Scope {
        Scope {
            name,
            positions: RefCell::new(SmallVec::new()),
            pointer: Cell::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Call positions resolved so far.
    pub fn len(&self) -> usize {
        self.positions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.borrow().is_empty()
    }

    /// Hook kinds at each position, in call order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.positions.borrow().iter().map(|p| p.kind).collect()
    }

    pub(crate) fn pointer(&self) -> usize {
        self.pointer.get()
    }

    pub(crate) fn reset(&self) {
        self.pointer.set(0);
    }

    pub(crate) fn next_position<T: 'static>(&self, kind: &'static str, init: impl FnOnce() -> T) -> Rc<T> {
        let index = self.pointer.get();
        self.pointer.set(index + 1);
        let mut positions = self.positions.borrow_mut();
        if index < positions.len() {
            let entry = &mut positions[index];
            if let Ok(cell) = entry.cell.clone().downcast::<T>() {
                return cell;
            }
            log::warn!(
                "{kind}: call position {index} in scope '{}' previously held {}; replacing. \
                 Positional hooks must not be called conditionally or in loops.",
                self.name,
                entry.kind
            );
            let cell = Rc::new(init());
            *entry = Position { kind, cell: cell.clone() };
            return cell;
        }
        debug_assert_eq!(index, positions.len());
        let cell = Rc::new(init());
        positions.push(Position { kind, cell: cell.clone() });
        cell
    }
}
