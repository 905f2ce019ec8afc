// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use tracing::{trace, warn};

use crate::{Bridged, Error, JoinHandle, once_result, wait_guard};

/// Launches one dedicated worker thread per blocking invocation and routes the outcome into the
/// invocation's result cell.
///
/// A dispatcher is an explicit handle - there is no ambient "current dispatcher" to look up, so
/// every component that offloads work states its dependency in its signature. Cloning is cheap and
/// clones share the worker numbering.
///
/// One thread per call is intentional: workers are detached, never pooled and never reused, which
/// is acceptable for low to medium call volume. Repeated calls to the same callable are not
/// serialized; callers that need mutual exclusion must arrange it themselves.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    core: Arc<DispatcherCore>,
}

#[derive(Debug)]
struct DispatcherCore {
    thread_name_prefix: String,
    next_worker_id: AtomicU64,
}

impl Dispatcher {
    /// Creates a dispatcher whose worker threads are named `offramp-worker-{n}`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_thread_name_prefix("offramp-worker")
    }

    /// Creates a dispatcher with a custom worker thread name prefix, to keep thread listings
    /// readable when multiple dispatchers coexist in one process.
    #[must_use]
    pub fn with_thread_name_prefix(prefix: impl Into<String>) -> Self {
        Self {
            core: Arc::new(DispatcherCore {
                thread_name_prefix: prefix.into(),
                next_worker_id: AtomicU64::new(0),
            }),
        }
    }

    /// Runs `body` on a newly spawned worker thread and immediately returns a [`JoinHandle`]
    /// resolving to its outcome - the hand-off never blocks the caller.
    ///
    /// A normal return fulfills the handle with the returned value. A panic inside `body` is
    /// captured on the worker thread and fails the handle with [`Error::BlockingCallFailed`]; it
    /// is never allowed to take the process down or to leave the handle pending forever. If the
    /// operating system refuses to spawn the thread, the handle resolves to [`Error::StdIo`].
    ///
    /// Dropping the handle abandons the outcome but not the work: the worker runs to completion
    /// and its result is discarded. There is no way to interrupt the blocking call itself.
    pub fn run_blocking<B, R>(&self, body: B) -> JoinHandle<R>
    where
        B: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (sender, receiver) = once_result::channel();
        let worker_name = self.next_worker_name();

        let spawned = thread::Builder::new()
            .name(worker_name.clone())
            .spawn(move || {
                wait_guard::mark_worker_thread();

                trace!(worker = worker_name.as_str(), "blocking call starting");

                match catch_unwind(AssertUnwindSafe(body)) {
                    Ok(value) => {
                        trace!(worker = worker_name.as_str(), "blocking call finished");

                        sender.fulfill(value);
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());

                        warn!(
                            worker = worker_name.as_str(),
                            panic = message.as_str(),
                            "blocking call panicked; surfacing the panic to the awaiting caller"
                        );

                        sender.fail(Error::BlockingCallFailed { message });
                    }
                }
            });

        match spawned {
            Ok(_detached) => JoinHandle::new(receiver),
            Err(error) => {
                // The rejected closure took the sender down with it. Hand back a fresh cell that
                // reports the spawn failure instead of the generic lost-worker outcome.
                let (sender, receiver) = once_result::channel();
                sender.fail(Error::StdIo(error));

                JoinHandle::new(receiver)
            }
        }
    }

    /// Wraps `body` for repeated invocation from coroutine context.
    ///
    /// Shorthand for [`Bridged::new`].
    pub fn bridge<B>(&self, body: B) -> Bridged<B> {
        Bridged::new(self, body)
    }

    fn next_worker_name(&self) -> String {
        let id = self.core.next_worker_id.fetch_add(1, Ordering::Relaxed);

        format!("{}-{id}", self.core.thread_name_prefix)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders a panic payload for the error channel. Payloads raised through `panic!` are strings in
/// practice; anything else gets a placeholder rather than a lossy guess.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic payload of non-string type".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_names_are_sequential_per_dispatcher() {
        let dispatcher = Dispatcher::with_thread_name_prefix("unit");

        assert_eq!(dispatcher.next_worker_name(), "unit-0");
        assert_eq!(dispatcher.next_worker_name(), "unit-1");
    }

    #[test]
    fn clones_share_worker_numbering() {
        let dispatcher = Dispatcher::with_thread_name_prefix("unit");
        let clone = dispatcher.clone();

        assert_eq!(dispatcher.next_worker_name(), "unit-0");
        assert_eq!(clone.next_worker_name(), "unit-1");
    }

    #[test]
    fn panic_messages_preserve_string_payloads() {
        let static_payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(static_payload.as_ref()), "boom");

        let owned_payload: Box<dyn Any + Send> = Box::new("boom".to_string());
        assert_eq!(panic_message(owned_payload.as_ref()), "boom");

        let odd_payload: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(
            panic_message(odd_payload.as_ref()),
            "panic payload of non-string type"
        );
    }
}
