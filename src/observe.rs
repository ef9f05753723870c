//! Synchronous change notification for the editable data model.
//!
//! Every mutable entity (path, style, gradient, shape, icon, command
//! stack) embeds an [`ObserverList`] and exposes it through the
//! [`Observable`] trait. Notification is a synchronous fan-out over weak
//! observer references; a nesting suspend counter batches bursts of
//! mutations into a single callback.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::error;

/// Receives change notifications from an [`Observable`].
pub trait Observer {
    /// Called synchronously after the observed object changed.
    ///
    /// The observed object may still be inside a mutating method; the
    /// callback must not re-enter it.
    fn object_changed(&self);
}

/// The observer bookkeeping embedded in every observable entity.
///
/// Observers are held weakly so observing never extends an object's
/// lifetime; they must nevertheless detach before the observable is
/// dropped — dropping a list with live observers is a programming error
/// and traps in debug builds.
#[derive(Default)]
pub struct ObserverList {
    observers: RefCell<Vec<Weak<dyn Observer>>>,
    suspended: Cell<i32>,
    pending: Cell<bool>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer. Duplicate registrations are ignored.
    pub fn add_observer(&self, observer: Weak<dyn Observer>) -> bool {
        let mut observers = self.observers.borrow_mut();
        if observers.iter().any(|o| o.ptr_eq(&observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Detaches an observer previously registered with `add_observer`.
    pub fn remove_observer(&self, observer: &Weak<dyn Observer>) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|o| !o.ptr_eq(observer));
        observers.len() != before
    }

    /// The number of still-live observers.
    pub fn count_observers(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    /// Fires `object_changed` on every live observer, in registration
    /// order.
    ///
    /// A snapshot of the list is taken first, so observers may detach
    /// (or attach others) from within the callback. While notifications
    /// are suspended only a pending flag is set.
    pub fn notify(&self) {
        if self.suspended.get() > 0 {
            self.pending.set(true);
            return;
        }
        let snapshot: Vec<Weak<dyn Observer>> = self.observers.borrow().clone();
        for weak in snapshot {
            if let Some(observer) = weak.upgrade() {
                observer.object_changed();
            }
        }
        self.pending.set(false);
        // Drop entries whose observers have gone away.
        self.observers.borrow_mut().retain(|o| o.strong_count() > 0);
    }

    /// Increments (`true`) or decrements (`false`) the suspend counter.
    ///
    /// When the counter returns to zero and a notification arrived in the
    /// meantime, `notify` fires exactly once.
    pub fn suspend_notifications(&self, suspend: bool) {
        let mut level = self.suspended.get() + if suspend { 1 } else { -1 };
        if level < 0 {
            error!("ObserverList::suspend_notifications(false) - suspend level below zero");
            level = 0;
        }
        self.suspended.set(level);
        if level == 0 && self.pending.get() {
            self.notify();
        }
    }
}

impl Drop for ObserverList {
    fn drop(&mut self) {
        debug_assert!(
            self.count_observers() == 0,
            "ObserverList dropped with {} observers still watching",
            self.count_observers()
        );
    }
}

/// Implemented by every entity that can be observed.
pub trait Observable {
    fn observer_list(&self) -> &ObserverList;

    fn add_observer(&self, observer: Weak<dyn Observer>) -> bool {
        self.observer_list().add_observer(observer)
    }

    fn remove_observer(&self, observer: &Weak<dyn Observer>) -> bool {
        self.observer_list().remove_observer(observer)
    }

    fn notify(&self) {
        self.observer_list().notify()
    }

    fn suspend_notifications(&self, suspend: bool) {
        self.observer_list().suspend_notifications(suspend)
    }
}

/// RAII guard that suspends notifications for the duration of a scope and
/// resumes them (firing a pending notification) on drop.
pub struct NotificationSuspender<'a> {
    list: &'a ObserverList,
}

impl<'a> NotificationSuspender<'a> {
    pub fn new(observable: &'a dyn Observable) -> Self {
        let list = observable.observer_list();
        list.suspend_notifications(true);
        Self { list }
    }
}

impl Drop for NotificationSuspender<'_> {
    fn drop(&mut self) {
        self.list.suspend_notifications(false);
    }
}

/// Downgrades a strong observer handle to the weak form stored in
/// [`ObserverList`].
pub fn observer_handle<T: Observer + 'static>(observer: &Rc<T>) -> Weak<dyn Observer> {
    let strong: Rc<dyn Observer> = observer.clone();
    Rc::downgrade(&strong)
}
