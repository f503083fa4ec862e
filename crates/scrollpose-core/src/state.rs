use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::composer::{RecomposeScope, RecomposeScopeInner};
use crate::composer_context::try_with_composer;
use crate::runtime::RuntimeHandle;

pub(crate) trait MutationPolicy<T> {
    fn equivalent(&self, a: &T, b: &T) -> bool;
}

/// Policy for reactive UI state: no write is ever equivalent to the current
/// value, so every replacement invalidates watchers even when the payload
/// compares equal. Event-sourced state relies on this to re-render once per
/// notification rather than once per distinct value.
pub(crate) struct NeverEqual;

impl<T> MutationPolicy<T> for NeverEqual {
    fn equivalent(&self, _a: &T, _b: &T) -> bool {
        false
    }
}

pub(crate) struct MutableStateInner<T: Clone + 'static> {
    value: RefCell<T>,
    policy: Rc<dyn MutationPolicy<T>>,
    watchers: RefCell<Vec<Weak<RecomposeScopeInner>>>,
    runtime: RuntimeHandle,
}

impl<T: Clone + 'static> MutableStateInner<T> {
    fn new(value: T, runtime: RuntimeHandle) -> Self {
        Self {
            value: RefCell::new(value),
            policy: Rc::new(NeverEqual),
            watchers: RefCell::new(Vec::new()),
            runtime,
        }
    }

    fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.value.borrow();
        f(&value)
    }

    fn invalidate_watchers(&self) {
        let watchers: Vec<Weak<RecomposeScopeInner>> = {
            let mut watchers = self.watchers.borrow_mut();
            watchers.retain(|w| w.strong_count() > 0);
            watchers.clone()
        };

        for watcher in watchers {
            if let Some(scope) = RecomposeScope::from_weak(&watcher) {
                scope.invalidate();
            }
        }
    }

    fn subscribe(&self, scope: &RecomposeScope) {
        let mut watchers = self.watchers.borrow_mut();
        watchers.retain(|w| w.strong_count() > 0);
        let already_registered = watchers
            .iter()
            .any(|w| RecomposeScope::ptr_eq_weak(w, scope));
        if !already_registered {
            watchers.push(scope.downgrade());
        }
    }
}

/// Read-only view of a [`MutableState`].
pub struct State<T: Clone + 'static> {
    inner: Rc<MutableStateInner<T>>,
}

impl<T: Clone + 'static> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> PartialEq for State<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> Eq for State<T> {}

impl<T: Clone + 'static> State<T> {
    fn subscribe_current_scope(&self) {
        if let Some(Some(scope)) = try_with_composer(|composer| composer.current_recompose_scope())
        {
            self.inner.subscribe(&scope);
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.subscribe_current_scope();
        self.inner.with_value(f)
    }

    pub fn value(&self) -> T {
        self.with(|value| value.clone())
    }

    pub fn get(&self) -> T {
        self.value()
    }
}

/// Writable reactive state cell owned by the UI thread.
///
/// Reads during composition subscribe the current recompose scope; writes
/// invalidate every live subscriber and schedule a new pass. A write to a
/// cell whose subscribers have all left the composition goes nowhere, which
/// is what resolves late notifications delivered around teardown.
pub struct MutableState<T: Clone + 'static> {
    inner: Rc<MutableStateInner<T>>,
}

impl<T: Clone + 'static> Clone for MutableState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> PartialEq for MutableState<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> Eq for MutableState<T> {}

impl<T: Clone + 'static> MutableState<T> {
    pub fn with_runtime(value: T, runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(MutableStateInner::new(value, runtime)),
        }
    }

    pub fn as_state(&self) -> State<T> {
        State {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.as_state().with(f)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.inner.runtime.assert_ui_thread();
        let result = {
            let mut value = self.inner.value.borrow_mut();
            f(&mut value)
        };
        self.inner.invalidate_watchers();
        result
    }

    pub fn replace(&self, value: T) {
        self.inner.runtime.assert_ui_thread();
        let equivalent = {
            let current = self.inner.value.borrow();
            self.inner.policy.equivalent(&current, &value)
        };
        if !equivalent {
            *self.inner.value.borrow_mut() = value;
        }
        self.inner.invalidate_watchers();
    }

    pub fn set_value(&self, value: T) {
        self.replace(value);
    }

    pub fn set(&self, value: T) {
        self.replace(value);
    }

    pub fn value(&self) -> T {
        self.as_state().value()
    }

    pub fn get(&self) -> T {
        self.value()
    }

    #[cfg(test)]
    pub(crate) fn watcher_count(&self) -> usize {
        let mut watchers = self.inner.watchers.borrow_mut();
        watchers.retain(|w| w.strong_count() > 0);
        watchers.len()
    }
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for MutableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.with_value(|value| {
            f.debug_struct("MutableState")
                .field("value", value)
                .finish()
        })
    }
}
