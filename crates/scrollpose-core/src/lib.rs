#![doc = r"Core composition runtime for the scrollpose hooks."]
#![allow(clippy::missing_const_for_thread_local)]

pub extern crate self as scrollpose_core;

pub mod collections;
mod composer;
pub mod composer_context;
mod effects;
pub mod hash;
pub mod owned;
pub mod platform;
pub mod runtime;
mod slot_table;
mod state;

pub use composer::{Composer, RecomposeScope};
pub use effects::{
    DisposableEffectResult, DisposableEffectScope, SideEffect, __disposable_effect_impl,
};
pub use owned::Owned;
pub use platform::RuntimeScheduler;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use state::{MutableState, State};

#[cfg(test)]
pub use runtime::TestScheduler;

use std::any::Any;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub type Key = u64;
pub(crate) type ScopeId = usize;
pub(crate) type LocalKey = usize;

static NEXT_SCOPE_ID: AtomicUsize = AtomicUsize::new(1);
static NEXT_LOCAL_KEY: AtomicUsize = AtomicUsize::new(1);

pub(crate) fn next_scope_id() -> ScopeId {
    NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)
}

fn next_local_key() -> LocalKey {
    NEXT_LOCAL_KEY.fetch_add(1, Ordering::Relaxed)
}

pub use composer_context::with_composer as with_current_composer;

#[allow(non_snake_case)]
pub fn withCurrentComposer<R>(f: impl FnOnce(&Composer) -> R) -> R {
    composer_context::with_composer(f)
}

pub fn with_key<K: Hash>(key: &K, content: impl FnOnce()) {
    with_current_composer(|composer| composer.with_key(key, |_| content()));
}

#[allow(non_snake_case)]
pub fn withKey<K: Hash>(key: &K, content: impl FnOnce()) {
    with_key(key, content)
}

pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Owned<T> {
    with_current_composer(|composer| composer.remember(init))
}

#[allow(non_snake_case)]
pub fn mutableStateOf<T: Clone + 'static>(initial: T) -> MutableState<T> {
    with_current_composer(|composer| composer.mutable_state_of(initial))
}

#[allow(non_snake_case)]
pub fn useState<T: Clone + 'static>(init: impl FnOnce() -> T) -> MutableState<T> {
    remember(|| mutableStateOf(init())).with(|state| state.clone())
}

#[allow(deprecated)]
#[deprecated(
    since = "0.1.0",
    note = "use useState(|| value) instead of use_state(|| value)"
)]
pub fn use_state<T: Clone + 'static>(init: impl FnOnce() -> T) -> MutableState<T> {
    useState(init)
}

pub struct ProvidedValue {
    key: LocalKey,
    value: Rc<dyn Any>,
}

impl ProvidedValue {
    pub(crate) fn into_entry(self) -> (LocalKey, Rc<dyn Any>) {
        (self.key, self.value)
    }
}

/// Makes the provided ambient values visible to `content` and every state
/// read below it.
#[allow(non_snake_case)]
pub fn CompositionLocalProvider(
    values: impl IntoIterator<Item = ProvidedValue>,
    content: impl FnOnce(),
) {
    with_current_composer(|composer| {
        let provided: Vec<_> = values
            .into_iter()
            .map(ProvidedValue::into_entry)
            .collect();
        composer.with_composition_locals(provided, |_composer| content());
    })
}

/// Ambient value for data that does not change during the lifetime of its
/// provider scope (host handles, configuration). Reads are not tracked by
/// the recomposition system, so providing a new value does not invalidate
/// readers on its own.
#[derive(Clone)]
pub struct StaticCompositionLocal<T: Clone + 'static> {
    key: LocalKey,
    default: Rc<dyn Fn() -> T>,
}

impl<T: Clone + 'static> PartialEq for StaticCompositionLocal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: Clone + 'static> Eq for StaticCompositionLocal<T> {}

impl<T: Clone + 'static> StaticCompositionLocal<T> {
    pub(crate) fn key(&self) -> LocalKey {
        self.key
    }

    pub fn provides(&self, value: T) -> ProvidedValue {
        ProvidedValue {
            key: self.key,
            value: Rc::new(value),
        }
    }

    pub fn current(&self) -> T {
        with_current_composer(|composer| composer.read_static_composition_local(self))
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }
}

#[allow(non_snake_case)]
pub fn staticCompositionLocalOf<T: Clone + 'static>(
    default: impl Fn() -> T + 'static,
) -> StaticCompositionLocal<T> {
    StaticCompositionLocal {
        key: next_local_key(),
        default: Rc::new(default),
    }
}

/// Owns the slot storage and runtime for one tree of composed content.
///
/// Rendering runs the content closure over the slot table, commits by
/// trimming unvisited content, then executes the side effects registered
/// during the pass. Hosts (or a test rule) call [`Composition::render`]
/// again whenever [`Composition::should_render`] reports pending work.
pub struct Composition {
    composer: Composer,
    runtime: Runtime,
}

impl Composition {
    pub fn new() -> Self {
        Self::with_runtime(Runtime::new(Arc::new(DefaultScheduler)))
    }

    pub fn with_runtime(runtime: Runtime) -> Self {
        let composer = Composer::new(runtime.handle());
        Self { composer, runtime }
    }

    pub fn render(&mut self, key: Key, mut content: impl FnMut()) {
        let handle = self.runtime.handle();
        handle.drain_ui();

        self.composer.begin_pass();
        let side_effects = self.composer.install(|composer| {
            composer.with_group(key, |_| content());
            composer.take_side_effects()
        });
        self.composer.finish_pass();

        for effect in side_effects {
            effect();
        }
        handle.drain_ui();

        // Scopes trimmed by this pass can never recompose; drop their
        // pending invalidations instead of pinning the dirty flag.
        handle.prune_dead_scopes();
        if !handle.has_invalid_scopes() && !handle.has_pending_ui() {
            self.runtime.set_needs_frame(false);
        }
    }

    pub fn should_render(&self) -> bool {
        self.runtime.needs_frame() || self.runtime.has_invalid_scopes()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

pub fn location_key(file: &str, line: u32, column: u32) -> Key {
    let base = file.as_ptr() as u64;
    base.wrapping_mul(0x9E37_79B9_7F4A_7C15) // cheap mix
        ^ ((line as u64) << 32)
        ^ (column as u64)
}

pub(crate) fn hash_key<K: Hash>(key: &K) -> Key {
    use std::hash::Hasher;
    let mut hasher = hash::default::new();
    key.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
