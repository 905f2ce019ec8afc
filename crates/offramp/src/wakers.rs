// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The resumption half of the contract between this crate and the external cooperative scheduler.
//!
//! The scheduler hands us a `Waker` every time a coroutine polls a pending result cell. The waker
//! is the scheduler's own thread-safe resumption primitive: invoking it from a worker thread hands
//! control back to the scheduler, which then resumes the suspended coroutine on its own execution
//! context. We never touch scheduler internals beyond this handle.

use std::task::Waker;

/// An ordered collection of registered wakers, woken exactly once each when the result cell they
/// are waiting on completes.
///
/// A single result cell typically has one waiter, but the ordering guarantee holds for any number.
/// Re-registration by the same task (per `Waker::will_wake`) replaces the stored waker in place,
/// so the most recent waker wins without disturbing the order of distinct waiters.
#[derive(Debug, Default)]
pub(crate) struct WakerList {
    wakers: Vec<Waker>,
}

impl WakerList {
    pub fn new() -> Self {
        Self { wakers: Vec::new() }
    }

    /// Records `waker` to be woken when the awaited outcome arrives.
    ///
    /// The `Future` API contract permits a task to poll again with a new waker; only the waker
    /// from the most recent poll may be woken in that case.
    pub fn register(&mut self, waker: &Waker) {
        if let Some(index) = self
            .wakers
            .iter()
            .position(|existing| existing.will_wake(waker))
        {
            self.wakers[index] = waker.clone();
        } else {
            self.wakers.push(waker.clone());
        }
    }

    /// Wakes every registered waiter once, in registration order.
    ///
    /// Callers must invoke this after releasing the result cell lock, so a waiter that resumes
    /// instantly does not contend on a lock we still hold.
    #[cfg_attr(test, mutants::skip)] // Critical primitive - causes test timeouts if tampered.
    pub fn wake_all(self) {
        for waker in self.wakers {
            waker.wake();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use futures::task::{ArcWake, waker};

    use super::*;

    struct OrderRecorder {
        id: usize,
        wake_order: Arc<Mutex<Vec<usize>>>,
        wake_count: AtomicUsize,
    }

    impl ArcWake for OrderRecorder {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.wake_order.lock().unwrap().push(arc_self.id);
            arc_self.wake_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn recorder(id: usize, wake_order: &Arc<Mutex<Vec<usize>>>) -> Arc<OrderRecorder> {
        Arc::new(OrderRecorder {
            id,
            wake_order: Arc::clone(wake_order),
            wake_count: AtomicUsize::new(0),
        })
    }

    #[test]
    fn wakes_in_registration_order() {
        let wake_order = Arc::new(Mutex::new(Vec::new()));

        let first = recorder(1, &wake_order);
        let second = recorder(2, &wake_order);

        let mut list = WakerList::new();
        list.register(&waker(Arc::clone(&first)));
        list.register(&waker(Arc::clone(&second)));

        list.wake_all();

        assert_eq!(wake_order.lock().unwrap().as_slice(), &[1, 2]);
    }

    #[test]
    fn reregistration_does_not_duplicate_wakeups() {
        let wake_order = Arc::new(Mutex::new(Vec::new()));

        let task = recorder(1, &wake_order);

        let mut list = WakerList::new();
        list.register(&waker(Arc::clone(&task)));
        list.register(&waker(Arc::clone(&task)));

        list.wake_all();

        assert_eq!(task.wake_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reregistration_keeps_original_position() {
        let wake_order = Arc::new(Mutex::new(Vec::new()));

        let first = recorder(1, &wake_order);
        let second = recorder(2, &wake_order);

        let mut list = WakerList::new();
        list.register(&waker(Arc::clone(&first)));
        list.register(&waker(Arc::clone(&second)));
        list.register(&waker(Arc::clone(&first)));

        list.wake_all();

        assert_eq!(wake_order.lock().unwrap().as_slice(), &[1, 2]);
    }

    #[test]
    fn empty_list_wakes_nobody() {
        let list = WakerList::new();

        // Completes without touching any waker.
        list.wake_all();
    }
}
