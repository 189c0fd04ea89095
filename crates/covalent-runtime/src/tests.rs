#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::composition::*;
    use crate::effects::*;
    use crate::locals::*;

    #[test]
    fn test_state_cell_roundtrip() {
        let c = Composition::mount(|| use_state(|| 41));
        assert_eq!(c.value().0, 41);
        assert_eq!(c.recompositions(), 1);

        c.value().1.set(42);
        assert_eq!(c.value().0, 42);
        assert_eq!(c.recompositions(), 2);

        c.value().1.update(|n| n + 1);
        assert_eq!(c.value().0, 43);
        assert_eq!(c.recompositions(), 3);
    }

    #[test]
    fn test_ref_cell_survives_passes_without_invalidation() {
        let c = Composition::mount(|| use_ref(|| 0));
        let handle = c.value();
        *handle.borrow_mut() = 7;

        c.recompose();
        assert!(Rc::ptr_eq(&handle, &c.value()));
        assert_eq!(*c.value().borrow(), 7);
        assert_eq!(c.recompositions(), 2);
    }

    #[test]
    fn test_slot_order_is_stable() {
        let c = Composition::mount(|| {
            let a = use_ref(|| "a");
            let b = use_ref(|| "b");
            (a, b)
        });
        let (a, b) = c.value();
        c.recompose();
        let (a2, b2) = c.value();
        assert!(Rc::ptr_eq(&a, &a2));
        assert!(Rc::ptr_eq(&b, &b2));
        assert_eq!(*a.borrow(), "a");
        assert_eq!(*b.borrow(), "b");
    }

    #[test]
    fn test_memo_recomputes_only_on_deps_change() {
        let runs = Rc::new(Cell::new(0));
        let dep = Rc::new(Cell::new(0));
        let c = {
            let runs = runs.clone();
            let dep = dep.clone();
            Composition::mount(move || {
                let runs = runs.clone();
                use_memo(dep.get(), move || {
                    runs.set(runs.get() + 1);
                })
            })
        };
        let first = c.value();
        assert_eq!(runs.get(), 1);

        c.recompose();
        assert_eq!(runs.get(), 1);
        assert!(Rc::ptr_eq(&first, &c.value()));

        dep.set(1);
        c.recompose();
        assert_eq!(runs.get(), 2);
        assert!(!Rc::ptr_eq(&first, &c.value()));
    }

    #[test]
    fn test_effect_phases_flush_in_order() {
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let c = {
            let order = order.clone();
            Composition::mount(move || {
                {
                    let order = order.clone();
                    use_effect((), move || {
                        order.borrow_mut().push("passive");
                        None
                    });
                }
                {
                    let order = order.clone();
                    use_layout_effect((), move || {
                        order.borrow_mut().push("layout");
                        None
                    });
                }
                order.borrow_mut().push("body");
            })
        };
        assert_eq!(*order.borrow(), vec!["body", "layout", "passive"]);
        drop(c);
    }

    #[test]
    fn test_effect_cleanup_runs_before_rerun_and_at_unmount() {
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let dep = Rc::new(Cell::new(0));
        let c = {
            let log = log.clone();
            let dep = dep.clone();
            Composition::mount(move || {
                let log = log.clone();
                let at = dep.get();
                use_layout_effect(at, move || {
                    log.borrow_mut().push(format!("run {at}"));
                    Some(Dispose::new(move || {
                        log.borrow_mut().push(format!("cleanup {at}"));
                    }))
                });
            })
        };
        assert_eq!(*log.borrow(), vec!["run 0"]);

        c.recompose();
        assert_eq!(*log.borrow(), vec!["run 0"]);

        dep.set(1);
        c.recompose();
        assert_eq!(*log.borrow(), vec!["run 0", "cleanup 0", "run 1"]);

        c.unmount();
        assert_eq!(*log.borrow(), vec!["run 0", "cleanup 0", "run 1", "cleanup 1"]);
        c.unmount();
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn test_dispose_runs_at_most_once() {
        let runs = Rc::new(Cell::new(0));
        let d = {
            let runs = runs.clone();
            Dispose::new(move || runs.set(runs.get() + 1))
        };
        d.run();
        d.run();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_set_during_pass_schedules_one_more_pass() {
        let c = Composition::mount(|| {
            let (n, set) = use_state(|| 0);
            if n == 0 {
                set.set(1);
            }
            n
        });
        assert_eq!(c.value(), 1);
        assert_eq!(c.recompositions(), 2);
    }

    #[test]
    fn test_locals_are_captured_at_mount() {
        let c = with_local(5i32, || Composition::mount(|| (current_local::<i32>(), use_state(|| 0).1)));
        assert_eq!(c.value().0, Some(5));
        assert_eq!(current_local::<i32>(), None);

        // Invalidation arrives from outside the frame; the pass still sees it.
        c.value().1.set(1);
        assert_eq!(c.value().0, Some(5));
    }

    #[test]
    fn test_inner_local_frame_wins() {
        let seen = with_local(1i32, || with_local(2i32, current_local::<i32>));
        assert_eq!(seen, Some(2));
    }

    #[test]
    #[should_panic(expected = "outside of an active composition")]
    fn test_cells_require_a_composition() {
        let _ = use_ref(|| 0);
    }

    #[test]
    fn test_unmounted_setter_is_ignored() {
        let c = Composition::mount(|| use_state(|| 0));
        let (_, set) = c.value();
        c.unmount();
        set.set(9);
        assert_eq!(c.recompositions(), 1);
    }
}
