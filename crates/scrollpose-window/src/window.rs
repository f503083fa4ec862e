use std::rc::Rc;

use scrollpose_core::{staticCompositionLocalOf, StaticCompositionLocal};

use crate::events::EventTarget;

/// A window-like rendering surface: current scroll offsets plus scroll
/// event registration.
pub trait WindowHandle: EventTarget {
    fn scroll_x(&self) -> f64;
    fn scroll_y(&self) -> f64;
}

pub type WindowRef = Rc<dyn WindowHandle>;

thread_local! {
    static LOCAL_WINDOW: StaticCompositionLocal<Option<WindowRef>> =
        staticCompositionLocalOf(default_window);
}

/// Ambient handle to the host window.
///
/// Defaults to the live browser window in interactive contexts and to
/// `None` where no rendering surface exists; a provider can substitute any
/// other surface for the content below it.
#[allow(non_snake_case)]
pub fn LocalWindow() -> StaticCompositionLocal<Option<WindowRef>> {
    LOCAL_WINDOW.with(|local| local.clone())
}

#[cfg(target_arch = "wasm32")]
fn default_window() -> Option<WindowRef> {
    use once_cell::unsync::OnceCell;

    thread_local! {
        static SHARED: OnceCell<Option<WindowRef>> = OnceCell::new();
    }

    SHARED.with(|cell| {
        cell.get_or_init(|| {
            if crate::environment::can_use_dom() {
                crate::web::BrowserWindow::from_global().map(|window| -> WindowRef { window })
            } else {
                None
            }
        })
        .clone()
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn default_window() -> Option<WindowRef> {
    None
}
