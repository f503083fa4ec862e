//! Detection of an interactive rendering surface.

#[cfg(target_arch = "wasm32")]
mod detect {
    use once_cell::sync::Lazy;

    static CAN_USE_DOM: Lazy<bool> = Lazy::new(|| {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let Some(document) = window.document() else {
            return false;
        };
        // Probe the element factory; pre-render contexts may ship a window
        // object without one.
        document.create_element("div").is_ok()
    });

    pub(super) fn can_use_dom() -> bool {
        *CAN_USE_DOM
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod detect {
    pub(super) fn can_use_dom() -> bool {
        false
    }
}

/// Whether a window-like rendering surface (window, document, and the
/// document's element factory) is available to this process.
///
/// Computed once on first use and never re-checked. Absence is an answer,
/// not an error: non-interactive contexts simply get `false`.
pub fn can_use_dom() -> bool {
    detect::can_use_dom()
}
