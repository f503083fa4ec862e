use std::any::Any;
use std::cell::{Cell, RefCell};
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::collections::map::HashMap;
use crate::composer_context;
use crate::runtime::RuntimeHandle;
use crate::slot_table::SlotTable;
use crate::state::MutableState;
use crate::{hash_key, next_scope_id, Key, LocalKey, Owned, ScopeId, StaticCompositionLocal};

pub(crate) struct RecomposeScopeInner {
    id: ScopeId,
    runtime: RuntimeHandle,
    invalid: Cell<bool>,
}

/// Invalidation token for one composed group.
///
/// State reads inside the group subscribe this scope; a later write marks it
/// invalid with the runtime, which schedules the next composition pass.
#[derive(Clone)]
pub struct RecomposeScope {
    inner: Rc<RecomposeScopeInner>,
}

impl RecomposeScope {
    pub(crate) fn new(runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(RecomposeScopeInner {
                id: next_scope_id(),
                runtime,
                invalid: Cell::new(false),
            }),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.inner.invalid.get()
    }

    pub(crate) fn invalidate(&self) {
        if !self.inner.invalid.replace(true) {
            self.inner
                .runtime
                .register_invalid_scope(self.inner.id, Rc::downgrade(&self.inner));
        }
    }

    pub(crate) fn mark_recomposed(&self) {
        self.inner.invalid.set(false);
        self.inner.runtime.mark_scope_recomposed(self.inner.id);
    }

    pub(crate) fn downgrade(&self) -> Weak<RecomposeScopeInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn ptr_eq_weak(weak: &Weak<RecomposeScopeInner>, other: &RecomposeScope) -> bool {
        weak.upgrade()
            .map(|inner| inner.id == other.inner.id)
            .unwrap_or(false)
    }

    pub(crate) fn from_weak(weak: &Weak<RecomposeScopeInner>) -> Option<RecomposeScope> {
        weak.upgrade().map(|inner| RecomposeScope { inner })
    }
}

#[derive(Default, Clone)]
struct LocalContext {
    values: HashMap<LocalKey, Rc<dyn Any>>,
}

pub(crate) struct ComposerCore {
    slots: RefCell<SlotTable>,
    runtime: RuntimeHandle,
    scope_stack: RefCell<Vec<RecomposeScope>>,
    local_stack: RefCell<Vec<LocalContext>>,
    side_effects: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl ComposerCore {
    fn new(runtime: RuntimeHandle) -> Self {
        Self {
            slots: RefCell::new(SlotTable::new()),
            runtime,
            scope_stack: RefCell::new(Vec::new()),
            local_stack: RefCell::new(Vec::new()),
            side_effects: RefCell::new(Vec::new()),
        }
    }
}

pub struct Composer {
    core: Rc<ComposerCore>,
}

impl Composer {
    pub(crate) fn new(runtime: RuntimeHandle) -> Self {
        Self {
            core: Rc::new(ComposerCore::new(runtime)),
        }
    }

    pub(crate) fn from_core(core: Rc<ComposerCore>) -> Self {
        Self { core }
    }

    pub(crate) fn clone_core(&self) -> Rc<ComposerCore> {
        Rc::clone(&self.core)
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.core.runtime.clone()
    }

    /// Make this composer current for the duration of `f`.
    pub fn install<R>(&self, f: impl FnOnce(&Composer) -> R) -> R {
        let _composer_guard = composer_context::enter(self);
        f(self)
    }

    /// Rewind the slot table for a fresh pass over the installed content.
    pub(crate) fn begin_pass(&self) {
        self.core.slots.borrow_mut().reset();
    }

    /// Close the pass, trimming content the pass did not visit. Trimmed
    /// slots are dropped here, outside the table borrow, so their teardown
    /// may freely call back into state and runtime.
    pub(crate) fn finish_pass(&self) {
        self.core.slots.borrow_mut().finish();
        let garbage = self.core.slots.borrow_mut().take_garbage();
        drop(garbage);
    }

    pub fn with_group<R>(&self, key: Key, f: impl FnOnce(&Composer) -> R) -> R {
        self.core.slots.borrow_mut().begin_group(key);
        let scope = self
            .core
            .slots
            .borrow_mut()
            .remember(|| RecomposeScope::new(self.runtime_handle()))
            .with(|scope| scope.clone());

        self.core.scope_stack.borrow_mut().push(scope.clone());
        let result = f(self);
        self.core.scope_stack.borrow_mut().pop();
        scope.mark_recomposed();

        self.core.slots.borrow_mut().end_group();
        let garbage = self.core.slots.borrow_mut().take_garbage();
        drop(garbage);
        result
    }

    pub fn with_key<K: Hash, R>(&self, key: &K, f: impl FnOnce(&Composer) -> R) -> R {
        let hashed = hash_key(key);
        self.with_group(hashed, f)
    }

    pub fn remember<T: 'static>(&self, init: impl FnOnce() -> T) -> Owned<T> {
        let owned = self.core.slots.borrow_mut().remember(init);
        let garbage = self.core.slots.borrow_mut().take_garbage();
        drop(garbage);
        owned
    }

    pub fn mutable_state_of<T: Clone + 'static>(&self, initial: T) -> MutableState<T> {
        MutableState::with_runtime(initial, self.runtime_handle())
    }

    pub fn current_recompose_scope(&self) -> Option<RecomposeScope> {
        self.core.scope_stack.borrow().last().cloned()
    }

    pub fn register_side_effect(&self, effect: impl FnOnce() + 'static) {
        self.core.side_effects.borrow_mut().push(Box::new(effect));
    }

    pub fn take_side_effects(&self) -> Vec<Box<dyn FnOnce()>> {
        std::mem::take(&mut *self.core.side_effects.borrow_mut())
    }

    pub(crate) fn with_composition_locals<R>(
        &self,
        provided: Vec<(LocalKey, Rc<dyn Any>)>,
        f: impl FnOnce(&Composer) -> R,
    ) -> R {
        let mut context = self
            .core
            .local_stack
            .borrow()
            .last()
            .cloned()
            .unwrap_or_default();
        for (key, value) in provided {
            context.values.insert(key, value);
        }
        self.core.local_stack.borrow_mut().push(context);
        let result = f(self);
        self.core.local_stack.borrow_mut().pop();
        result
    }

    pub fn read_static_composition_local<T: Clone + 'static>(
        &self,
        local: &StaticCompositionLocal<T>,
    ) -> T {
        let stack = self.core.local_stack.borrow();
        for context in stack.iter().rev() {
            if let Some(entry) = context.values.get(&local.key()) {
                return entry
                    .downcast_ref::<T>()
                    .expect("composition local type mismatch")
                    .clone();
            }
        }
        local.default_value()
    }
}
