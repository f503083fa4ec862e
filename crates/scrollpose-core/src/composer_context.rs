//! Thread-local tracking of the composer that is currently composing.
//!
//! Free functions like `remember` and `useState` resolve their composer
//! through this stack, so hooks stay zero-argument at call sites.

use std::cell::RefCell;
use std::rc::Rc;

use crate::composer::{Composer, ComposerCore};

thread_local! {
    static COMPOSER_STACK: RefCell<Vec<Rc<ComposerCore>>> = const { RefCell::new(Vec::new()) };
}

/// Pops the composer stack on drop, keeping the stack balanced even when
/// content panics mid-pass.
#[must_use = "dropping the guard is what pops the composer stack"]
pub(crate) struct ComposerScopeGuard;

impl Drop for ComposerScopeGuard {
    fn drop(&mut self) {
        COMPOSER_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

pub(crate) fn enter(composer: &Composer) -> ComposerScopeGuard {
    COMPOSER_STACK.with(|stack| {
        stack.borrow_mut().push(composer.clone_core());
    });
    ComposerScopeGuard
}

/// Access the current composer.
///
/// # Panics
/// Panics if no composition pass is active on this thread.
pub fn with_composer<R>(f: impl FnOnce(&Composer) -> R) -> R {
    try_with_composer(f).expect("with_composer: no active composer")
}

/// Access the current composer, or `None` when no pass is active. State
/// reads outside composition use this to skip scope subscription.
pub fn try_with_composer<R>(f: impl FnOnce(&Composer) -> R) -> Option<R> {
    COMPOSER_STACK.with(|stack| {
        let core = stack.borrow().last()?.clone();
        let composer = Composer::from_core(core);
        Some(f(&composer))
    })
}
