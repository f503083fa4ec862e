//! Platform abstraction for composition runtime services.
//!
//! The runtime delegates frame scheduling to the host platform through this
//! trait, so the same composition machinery runs under a browser event loop,
//! a desktop shell, or a headless test harness.

/// Schedules work for the composition runtime.
///
/// Implementations are responsible for arranging a new frame in which the
/// runtime can recompose invalidated content and drain queued UI work. They
/// must be safe to use from multiple threads.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}
