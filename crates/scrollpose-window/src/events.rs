use std::rc::Rc;

/// Handler invoked once per notification. Identity is the `Rc` allocation
/// itself, which is what removal matches on.
pub type EventHandler = Rc<dyn Fn()>;

/// An event-emitting target capable of registering and removing handlers by
/// event name.
pub trait EventTarget {
    fn add_event_listener(&self, event: &str, handler: EventHandler);
    fn remove_event_listener(&self, event: &str, handler: &EventHandler);
}

/// Attach `handler` to `target` under `event` and return the registration
/// handle that detaches it.
///
/// Attachment happens immediately and synchronously. The handle releases at
/// most once: [`ListenerRegistration::release`] calls after the first are
/// no-ops, and dropping the handle releases too, so a registration never
/// outlives its owner. Callers only invoke this once a target is known to
/// exist, so there is nothing to retry and no failure to surface.
pub fn managed_event_listener<T>(
    target: Rc<T>,
    event: impl Into<String>,
    handler: impl Fn() + 'static,
) -> ListenerRegistration<T>
where
    T: EventTarget + ?Sized + 'static,
{
    let event = event.into();
    let handler: EventHandler = Rc::new(handler);
    target.add_event_listener(&event, handler.clone());
    log::trace!("attached {event:?} listener");
    ListenerRegistration {
        target,
        event,
        handler: Some(handler),
    }
}

/// Ownership token for one active listener registration.
pub struct ListenerRegistration<T: EventTarget + ?Sized + 'static = dyn EventTarget> {
    target: Rc<T>,
    event: String,
    handler: Option<EventHandler>,
}

impl<T: EventTarget + ?Sized + 'static> ListenerRegistration<T> {
    /// Detach the handler from the target. Only the first call removes
    /// anything; later calls are no-ops.
    pub fn release(&mut self) {
        if let Some(handler) = self.handler.take() {
            self.target.remove_event_listener(&self.event, &handler);
            log::trace!("released {:?} listener", self.event);
        }
    }

    pub fn is_active(&self) -> bool {
        self.handler.is_some()
    }
}

impl<T: EventTarget + ?Sized + 'static> Drop for ListenerRegistration<T> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingTarget {
        listeners: RefCell<Vec<(String, EventHandler)>>,
        removes: Cell<usize>,
    }

    impl RecordingTarget {
        fn count(&self, event: &str) -> usize {
            self.listeners
                .borrow()
                .iter()
                .filter(|(name, _)| name == event)
                .count()
        }
    }

    impl EventTarget for RecordingTarget {
        fn add_event_listener(&self, event: &str, handler: EventHandler) {
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
                self.removes.set(self.removes.get() + 1);
            }
        }
    }

    #[test]
    fn attaches_immediately_and_releases_on_demand() {
        let target = Rc::new(RecordingTarget::default());
        let mut registration =
            managed_event_listener(target.clone(), "scroll", || {});
        assert_eq!(target.count("scroll"), 1);
        assert!(registration.is_active());

        registration.release();
        assert_eq!(target.count("scroll"), 0);
        assert!(!registration.is_active());
    }

    #[test]
    fn release_is_idempotent() {
        let target = Rc::new(RecordingTarget::default());
        let mut registration =
            managed_event_listener(target.clone(), "scroll", || {});

        registration.release();
        registration.release();
        drop(registration);
        assert_eq!(target.removes.get(), 1);
    }

    #[test]
    fn drop_releases_the_registration() {
        let target = Rc::new(RecordingTarget::default());
        {
            let _registration =
                managed_event_listener(target.clone(), "scroll", || {});
            assert_eq!(target.count("scroll"), 1);
        }
        assert_eq!(target.count("scroll"), 0);
    }

    #[test]
    fn release_removes_only_its_own_handler() {
        let target = Rc::new(RecordingTarget::default());
        let mut first =
            managed_event_listener(target.clone(), "scroll", || {});
        let second = managed_event_listener(target.clone(), "scroll", || {});
        assert_eq!(target.count("scroll"), 2);

        first.release();
        assert_eq!(target.count("scroll"), 1);
        assert!(second.is_active());
        drop(second);
        assert_eq!(target.count("scroll"), 0);
    }
}
