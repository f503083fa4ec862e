use super::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

thread_local! {
    static EFFECT_LOG: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
}

fn log_event(event: &'static str) {
    EFFECT_LOG.with(|log| log.borrow_mut().push(event));
}

fn logged_events() -> Vec<&'static str> {
    EFFECT_LOG.with(|log| log.borrow().clone())
}

fn root_key() -> Key {
    location_key(file!(), line!(), column!())
}

#[test]
fn remember_persists_across_renders() {
    let mut composition = Composition::new();
    let key = root_key();
    let init_runs = Rc::new(Cell::new(0));
    let seen = Rc::new(Cell::new(0u32));

    let mut content = || {
        let runs = init_runs.clone();
        let value = remember(move || {
            runs.set(runs.get() + 1);
            7u32
        });
        seen.set(value.with(|v| *v));
    };

    for _ in 0..3 {
        composition.render(key, &mut content);
    }

    assert_eq!(init_runs.get(), 1);
    assert_eq!(seen.get(), 7);
}

#[test]
fn state_write_triggers_recomposition() {
    let mut composition = Composition::new();
    let key = root_key();
    let captured: Rc<RefCell<Option<MutableState<i32>>>> = Rc::new(RefCell::new(None));
    let observed = Rc::new(Cell::new(-1));

    let mut content = || {
        let state = useState(|| 0);
        observed.set(state.value());
        *captured.borrow_mut() = Some(state);
    };

    composition.render(key, &mut content);
    assert_eq!(observed.get(), 0);
    assert!(!composition.should_render());

    captured.borrow().as_ref().unwrap().set(5);
    assert!(composition.should_render());

    composition.render(key, &mut content);
    assert_eq!(observed.get(), 5);
    assert!(!composition.should_render());
}

#[test]
fn identical_writes_each_trigger_a_pass() {
    let mut composition = Composition::new();
    let key = root_key();
    let captured: Rc<RefCell<Option<MutableState<i32>>>> = Rc::new(RefCell::new(None));
    let renders = Rc::new(Cell::new(0));

    let mut content = || {
        renders.set(renders.get() + 1);
        let state = useState(|| 42);
        let _ = state.value();
        *captured.borrow_mut() = Some(state);
    };

    composition.render(key, &mut content);
    assert_eq!(renders.get(), 1);

    for expected in [2, 3] {
        captured.borrow().as_ref().unwrap().set(42);
        assert!(
            composition.should_render(),
            "a write of an equal value must still schedule a pass"
        );
        composition.render(key, &mut content);
        assert_eq!(renders.get(), expected);
    }
}

#[test]
fn disposable_effect_runs_once_across_renders() {
    let key = root_key();
    let mut composition = Composition::new();

    let mut content = || {
        DisposableEffect!((), |scope| {
            log_event("start");
            scope.on_dispose(|| log_event("dispose"))
        });
    };

    for _ in 0..3 {
        composition.render(key, &mut content);
    }
    assert_eq!(logged_events(), ["start"]);

    // Dropping the composition is the terminal teardown path.
    drop(composition);
    assert_eq!(logged_events(), ["start", "dispose"]);
}

#[test]
fn disposable_effect_cleans_up_on_conditional_removal() {
    let key = root_key();
    let mut composition = Composition::new();
    let captured: Rc<RefCell<Option<MutableState<bool>>>> = Rc::new(RefCell::new(None));

    let mut content = || {
        let show = useState(|| true);
        *captured.borrow_mut() = Some(show.clone());
        if show.value() {
            with_key(&"effect-host", || {
                DisposableEffect!((), |scope| {
                    log_event("start");
                    scope.on_dispose(|| log_event("dispose"))
                });
            });
        }
    };

    composition.render(key, &mut content);
    assert_eq!(logged_events(), ["start"]);

    captured.borrow().as_ref().unwrap().set(false);
    composition.render(key, &mut content);
    assert_eq!(logged_events(), ["start", "dispose"]);

    // Remounting starts a fresh effect.
    captured.borrow().as_ref().unwrap().set(true);
    composition.render(key, &mut content);
    assert_eq!(logged_events(), ["start", "dispose", "start"]);
}

#[test]
fn disposable_effect_reacts_to_key_changes() {
    let key = root_key();
    let mut composition = Composition::new();
    let captured: Rc<RefCell<Option<MutableState<i32>>>> = Rc::new(RefCell::new(None));

    let mut content = || {
        let version = useState(|| 0);
        *captured.borrow_mut() = Some(version.clone());
        DisposableEffect!(version.value(), |scope| {
            log_event("start");
            scope.on_dispose(|| log_event("dispose"))
        });
    };

    composition.render(key, &mut content);
    assert_eq!(logged_events(), ["start"]);

    // Same key: nothing restarts.
    composition.render(key, &mut content);
    assert_eq!(logged_events(), ["start"]);

    captured.borrow().as_ref().unwrap().set(1);
    composition.render(key, &mut content);
    assert_eq!(logged_events(), ["start", "dispose", "start"]);
}

#[test]
fn side_effect_runs_after_every_registering_pass() {
    let key = root_key();
    let mut composition = Composition::new();

    let mut content = || {
        log_event("compose");
        SideEffect(|| log_event("effect"));
    };

    composition.render(key, &mut content);
    assert_eq!(logged_events(), ["compose", "effect"]);

    composition.render(key, &mut content);
    assert_eq!(logged_events(), ["compose", "effect", "compose", "effect"]);
}

thread_local! {
    static LOCAL_LABEL: StaticCompositionLocal<String> =
        staticCompositionLocalOf(|| "default".to_string());
}

fn local_label() -> StaticCompositionLocal<String> {
    LOCAL_LABEL.with(|local| local.clone())
}

#[test]
fn static_composition_local_provides_and_defaults() {
    let key = root_key();
    let mut composition = Composition::new();
    let outside = Rc::new(RefCell::new(String::new()));
    let inside = Rc::new(RefCell::new(String::new()));

    let mut content = || {
        *outside.borrow_mut() = local_label().current();
        let inside = inside.clone();
        CompositionLocalProvider([local_label().provides("provided".to_string())], move || {
            *inside.borrow_mut() = local_label().current();
        });
    };

    composition.render(key, &mut content);
    assert_eq!(*outside.borrow(), "default");
    assert_eq!(*inside.borrow(), "provided");
}

#[test]
fn state_usable_outside_composition() {
    let runtime = Runtime::new(Arc::new(TestScheduler));
    let state = MutableState::with_runtime(3, runtime.handle());
    assert_eq!(state.value(), 3);

    state.set(4);
    assert_eq!(state.get(), 4);
    // No composition pass ever read this state, so nothing subscribed.
    assert_eq!(state.watcher_count(), 0);
}

#[test]
fn writes_after_unmount_do_not_schedule_work() {
    let key = root_key();
    let mut composition = Composition::new();
    let captured: Rc<RefCell<Option<MutableState<bool>>>> = Rc::new(RefCell::new(None));
    let leaked: Rc<RefCell<Option<MutableState<i32>>>> = Rc::new(RefCell::new(None));

    let mut content = || {
        let show = useState(|| true);
        *captured.borrow_mut() = Some(show.clone());
        if show.value() {
            with_key(&"leaf", || {
                let inner = useState(|| 0);
                let _ = inner.value();
                *leaked.borrow_mut() = Some(inner.clone());
            });
        }
    };

    composition.render(key, &mut content);
    captured.borrow().as_ref().unwrap().set(false);
    composition.render(key, &mut content);
    assert!(!composition.should_render());

    // The cell handle outlives the slot, but its watchers are gone.
    leaked.borrow().as_ref().unwrap().set(99);
    assert!(!composition.should_render());
}
