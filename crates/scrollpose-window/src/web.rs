use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::events::{EventHandler, EventTarget};
use crate::window::WindowHandle;

/// The real browser window as a scroll surface.
///
/// Registered handlers are bridged through `wasm-bindgen` closures. Each
/// bridge closure is kept alive here and dropped on removal, mirroring the
/// function-identity removal contract of the DOM listener API.
pub struct BrowserWindow {
    window: web_sys::Window,
    bridges: RefCell<Vec<ListenerBridge>>,
}

struct ListenerBridge {
    event: String,
    handler: EventHandler,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl BrowserWindow {
    /// Wrap the global window of this context, if it has one.
    pub fn from_global() -> Option<Rc<Self>> {
        web_sys::window().map(|window| {
            Rc::new(Self {
                window,
                bridges: RefCell::new(Vec::new()),
            })
        })
    }
}

impl EventTarget for BrowserWindow {
    fn add_event_listener(&self, event: &str, handler: EventHandler) {
        let callback = handler.clone();
        let closure =
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| callback());
        let _ = self
            .window
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        self.bridges.borrow_mut().push(ListenerBridge {
            event: event.to_string(),
            handler,
            closure,
        });
    }

    fn remove_event_listener(&self, event: &str, handler: &EventHandler) {
        let mut bridges = self.bridges.borrow_mut();
        if let Some(index) = bridges
            .iter()
            .position(|bridge| bridge.event == event && Rc::ptr_eq(&bridge.handler, handler))
        {
            let bridge = bridges.remove(index);
            let _ = self
                .window
                .remove_event_listener_with_callback(event, bridge.closure.as_ref().unchecked_ref());
        }
    }
}

impl WindowHandle for BrowserWindow {
    fn scroll_x(&self) -> f64 {
        self.window.scroll_x().unwrap_or_default()
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or_default()
    }
}
