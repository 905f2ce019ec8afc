// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::pin::Pin;
use std::task;

use futures::FutureExt;

use crate::once_result::OutcomeReceiver;
use crate::{Result, wait_guard};

/// Enables the caller to obtain the outcome of one offloaded blocking call.
///
/// This is the suspension half of the scheduler interop contract: the handle is a plain `Future`,
/// so any cooperative scheduler can suspend a coroutine on it without blocking the thread(s) that
/// run its other coroutines. Awaiting yields the callable's value, or propagates its failure
/// exactly as if the call had been made synchronously and had raised in place.
///
/// # Panics
///
/// The outcome may be obtained at most once, either by awaiting the handle or by calling `wait`.
/// Attempting to obtain the outcome multiple times will panic.
#[derive(Debug)]
pub struct JoinHandle<R>
where
    R: Send + 'static,
{
    receiver: OutcomeReceiver<R>,
}

impl<R> JoinHandle<R>
where
    R: Send + 'static,
{
    pub(crate) const fn new(receiver: OutcomeReceiver<R>) -> Self {
        Self { receiver }
    }

    /// Synchronously waits for the blocking call to complete, returning its outcome.
    ///
    /// This drives the handle on the calling thread and is only intended for blocking-safe
    /// contexts such as `fn main()` or a `#[test]` entry point, where no cooperative scheduler is
    /// in charge.
    ///
    /// # Panics
    ///
    /// Panics if the outcome has already been obtained either via `wait()` or by awaiting.
    ///
    /// Panics if called from a dispatcher-owned worker thread - offloaded bodies must not block
    /// on each other through this entry point.
    pub fn wait(&mut self) -> Result<R> {
        wait_guard::assert_wait_allowed();

        futures::executor::block_on(futures::future::poll_fn(|cx| self.receiver.poll_unpin(cx)))
    }
}

impl<R> Future for JoinHandle<R>
where
    R: Send + 'static,
{
    type Output = Result<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> task::Poll<Self::Output> {
        self.receiver.poll_unpin(cx)
    }
}
