use scrollpose_core::{
    useState, DisposableEffect, DisposableEffectResult, DisposableEffectScope,
};

use crate::events::managed_event_listener;
use crate::window::{LocalWindow, WindowHandle};

/// Viewport scroll offsets in CSS pixels.
///
/// Values come straight from the host surface; they are replaced wholesale
/// on every scroll notification, never mutated in place.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    pub fn of(window: &dyn WindowHandle) -> Self {
        Self {
            x: window.scroll_x(),
            y: window.scroll_y(),
        }
    }
}

/// Current window scroll offset as composition state.
///
/// Seeds from the live window when a rendering surface exists and from
/// `(0, 0)` otherwise, then holds exactly one `"scroll"` subscription for
/// the lifetime of the consuming content: attached after the mounting pass
/// commits, detached when the content leaves the composition.
/// Recompositions in between neither re-attach nor re-read the surface.
///
/// Every notification replaces the state; consecutive events reporting the
/// same offset still recompose consumers.
#[allow(non_snake_case)]
pub fn useWindowScrollPosition() -> ScrollPosition {
    let window = LocalWindow().current();

    let position = {
        let window = window.clone();
        useState(move || {
            window
                .as_ref()
                .map(|window| ScrollPosition::of(&**window))
                .unwrap_or_default()
        })
    };

    let state = position.clone();
    DisposableEffect!((), move |scope: DisposableEffectScope| {
        let Some(window) = window else {
            // No surface: nothing to subscribe to, nothing to release.
            return DisposableEffectResult::default();
        };
        let registration = {
            let window = window.clone();
            managed_event_listener(window.clone(), "scroll", move || {
                state.set(ScrollPosition::of(&*window));
            })
        };
        scope.on_dispose(move || {
            let mut registration = registration;
            registration.release();
        })
    });

    position.value()
}
