// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use crate::{Dispatcher, JoinHandle};

/// A blocking callable wrapped so coroutine context can invoke it without stalling the scheduler.
///
/// Wrapping happens once; [`call`][Self::call] may then be invoked any number of times. Every
/// invocation offloads one execution of the callable through the dispatcher and returns an
/// independent awaitable handle - concurrent invocations share nothing beyond the wrapped callable
/// reference itself, so their outcomes cannot interfere.
///
/// Clones share the same callable and dispatcher.
#[derive(Debug)]
pub struct Bridged<B> {
    dispatcher: Dispatcher,
    body: Arc<B>,
}

impl<B> Bridged<B> {
    /// Wraps `body` for repeated offloaded invocation through `dispatcher`.
    pub fn new(dispatcher: &Dispatcher, body: B) -> Self {
        Self {
            dispatcher: dispatcher.clone(),
            body: Arc::new(body),
        }
    }

    /// Starts one offloaded invocation of the wrapped callable.
    ///
    /// The returned handle is awaitable from coroutine context; awaiting it suspends the calling
    /// coroutine until the worker thread has recorded the callable's value or failure, then
    /// resumes with that outcome. Each call spawns exactly one worker thread.
    pub fn call<R>(&self) -> JoinHandle<R>
    where
        B: Fn() -> R + Send + Sync + 'static,
        R: Send + 'static,
    {
        let body = Arc::clone(&self.body);

        self.dispatcher.run_blocking(move || (*body)())
    }
}

impl<B> Clone for Bridged<B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            body: Arc::clone(&self.body),
        }
    }
}
