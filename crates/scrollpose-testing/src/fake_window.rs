use std::cell::{Cell, RefCell};
use std::rc::Rc;

use scrollpose_window::{EventHandler, EventTarget, WindowHandle};

/// Scriptable scroll surface for driving window hooks without a browser.
///
/// Records every registration so tests can assert exactly how many
/// listeners a mounted hook holds, scripts the scroll offset, and delivers
/// notifications synchronously in registration order.
pub struct FakeWindow {
    scroll: Cell<(f64, f64)>,
    listeners: RefCell<Vec<(String, EventHandler)>>,
    total_adds: Cell<usize>,
    total_removes: Cell<usize>,
}

impl FakeWindow {
    pub fn new(scroll_x: f64, scroll_y: f64) -> Rc<Self> {
        Rc::new(Self {
            scroll: Cell::new((scroll_x, scroll_y)),
            listeners: RefCell::new(Vec::new()),
            total_adds: Cell::new(0),
            total_removes: Cell::new(0),
        })
    }

    pub fn set_scroll(&self, x: f64, y: f64) {
        self.scroll.set((x, y));
    }

    /// Move to the given offset and notify listeners, like a real window.
    pub fn scroll_to(&self, x: f64, y: f64) {
        self.set_scroll(x, y);
        self.emit_scroll();
    }

    /// Deliver one scroll notification to every `"scroll"` listener, in
    /// registration order.
    pub fn emit_scroll(&self) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(event, _)| event == "scroll")
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    /// Registrations ever made against this window.
    pub fn total_adds(&self) -> usize {
        self.total_adds.get()
    }

    /// Removals ever performed against this window.
    pub fn total_removes(&self) -> usize {
        self.total_removes.get()
    }
}

impl EventTarget for FakeWindow {
    fn add_event_listener(&self, event: &str, handler: EventHandler) {
        self.total_adds.set(self.total_adds.get() + 1);
        self.listeners
            .borrow_mut()
            .push((event.to_string(), handler));
    }

    fn remove_event_listener(&self, event: &str, handler: &EventHandler) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(index) = listeners
            .iter()
            .position(|(name, registered)| name == event && Rc::ptr_eq(registered, handler))
        {
            listeners.remove(index);
            self.total_removes.set(self.total_removes.get() + 1);
        }
    }
}

impl WindowHandle for FakeWindow {
    fn scroll_x(&self) -> f64 {
        self.scroll.get().0
    }

    fn scroll_y(&self) -> f64 {
        self.scroll.get().1
    }
}
