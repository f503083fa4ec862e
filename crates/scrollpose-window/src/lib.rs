#![doc = r"Viewport scroll offset exposed as reactive composition state."]

mod environment;
mod events;
mod scroll;
mod window;

#[cfg(target_arch = "wasm32")]
mod web;

pub use environment::can_use_dom;
pub use events::{managed_event_listener, EventHandler, EventTarget, ListenerRegistration};
pub use scroll::{useWindowScrollPosition, ScrollPosition};
pub use window::{LocalWindow, WindowHandle, WindowRef};

#[cfg(target_arch = "wasm32")]
pub use web::BrowserWindow;
