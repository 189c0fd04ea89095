use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Frame = Rc<HashMap<TypeId, Rc<dyn Any>>>;

thread_local! {
    static STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

pub(crate) struct FrameGuard {
    count: usize,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        STACK.with(|st| {
            let mut st = st.borrow_mut();
            for _ in 0..self.count {
                st.pop();
            }
        });
    }
}

/// Makes `value` the ambient local of its type for every call nested in `f`.
/// Frames nest; the innermost value of a type wins.
pub fn with_local<T: 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    let mut frame: HashMap<TypeId, Rc<dyn Any>> = HashMap::new();
    frame.insert(TypeId::of::<T>(), Rc::new(value));
    STACK.with(|st| st.borrow_mut().push(Rc::new(frame)));
    let _guard = FrameGuard { count: 1 };
    f()
}

/// The innermost ambient value of type `T`, if any frame provides one.
pub fn current_local<T: Clone + 'static>() -> Option<T> {
    STACK.with(|st| {
        st.borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.get(&TypeId::of::<T>()).and_then(|v| v.downcast_ref::<T>()).cloned())
    })
}

/// The local frames active right now, cheap to clone and to reinstate later.
#[derive(Clone, Default)]
pub struct Snapshot {
    frames: Vec<Frame>,
}

pub fn capture() -> Snapshot {
    STACK.with(|st| Snapshot { frames: st.borrow().clone() })
}

pub(crate) fn reinstate(snapshot: &Snapshot) -> FrameGuard {
    STACK.with(|st| st.borrow_mut().extend(snapshot.frames.iter().cloned()));
    FrameGuard { count: snapshot.frames.len() }
}
