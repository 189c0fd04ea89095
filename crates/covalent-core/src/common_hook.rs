use std::rc::Rc;

use crate::inspect;
use crate::registry::{StoreRegistry, Token, ambient_registry};
use crate::scope::Scope;

/// A composable hook wrapped to own a private positional scope. Cloneable;
/// every clone shares the same scope token, so all call sites of one
/// definition resolve the same positions.
pub struct CommonHook<Args, R> {
    token: Token,
    name: &'static str,
    body: Rc<dyn Fn(Args) -> R>,
}

impl<Args, R> Clone for CommonHook<Args, R> {
    fn clone(&self) -> Self {
        CommonHook {
            token: self.token,
            name: self.name,
            body: self.body.clone(),
        }
    }
}

/// Wraps `body` so that positional hooks called inside it resolve against a
/// scope private to this definition. The scope is allocated lazily, once per
/// registry, on the first invocation.
pub fn create_common_hook<Args: 'static, R: 'static>(
    name: &'static str,
    body: impl Fn(Args) -> R + 'static,
) -> CommonHook<Args, R> {
    CommonHook {
        token: Token::unique(),
        name,
        body: Rc::new(body),
    }
}

struct ScopeFrame<'a> {
    registry: &'a StoreRegistry,
    parent: Option<Rc<Scope>>,
    name: &'static str,
}

impl Drop for ScopeFrame<'_> {
    fn drop(&mut self) {
        inspect::emit(|i| i.scope_exit(self.name));
        self.registry.swap_scope(self.parent.take());
    }
}

impl<Args: 'static, R: 'static> CommonHook<Args, R> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// This definition's scope in `registry`, resolving (and creating) it if
    /// needed.
    pub fn scope_in(&self, registry: &StoreRegistry) -> Rc<Scope> {
        registry.resolve_cell(self.token, self.name, || Scope::new(self.name))
    }

    /// Invokes the body inside this hook's scope: the parent scope is saved,
    /// the pointer rewound, and the parent restored afterwards — also on
    /// unwind, so a panicking body cannot corrupt an enclosing scope.
    pub fn call(&self, args: Args) -> R {
        let registry = ambient_registry();
        let scope = self.scope_in(&registry);
        let parent = registry.swap_scope(Some(scope.clone()));
        scope.reset();
        inspect::emit(|i| i.scope_enter(self.name));
        let _frame = ScopeFrame { registry: &registry, parent, name: self.name };
        (self.body)(args)
    }
}

impl<R: 'static> CommonHook<(), R> {
    /// `call(())` for hooks without arguments.
    pub fn invoke(&self) -> R {
        self.call(())
    }
}
