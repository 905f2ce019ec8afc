// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Offloads blocking, synchronous work onto dedicated worker threads and bridges each outcome back
//! into a cooperative scheduler through a single-assignment future.
//!
//! A cooperative scheduler interleaves many suspended computations on one thread and must never
//! execute a call that blocks that thread. This crate provides the other half of that bargain: a
//! [`Dispatcher`] that runs a blocking callable on its own worker thread, and a [`JoinHandle`]
//! future the calling coroutine suspends on until the worker has recorded a value or a failure.
//!
//! The crate does not include a scheduler. Any executor that can poll futures works, because the
//! interop surface is the standard one: [`JoinHandle`] implements `Future`, and the `Waker`
//! captured at poll time is the thread-safe handle through which the worker thread resumes the
//! suspended coroutine on the scheduler's own execution context. Threads that are not running an
//! executor at all (`fn main()`, tests) can use [`JoinHandle::wait`] instead.
//!
//! ```
//! use offramp::Dispatcher;
//!
//! let dispatcher = Dispatcher::new();
//!
//! let fetch = dispatcher.bridge(|| {
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//!     42
//! });
//!
//! let outcome = futures::executor::block_on(fetch.call());
//! assert_eq!(outcome.expect("the callable does not fail"), 42);
//! ```

// Public API surface.
mod bridge;
mod dispatch;
mod error;
mod join;

pub use bridge::*;
pub use dispatch::*;
pub use error::*;
pub use join::*;

// Internal to the crate but re-exported at crate root for reduced hassle.
mod constants;
mod wakers;

pub(crate) use constants::ERR_POISONED_LOCK;
pub(crate) use wakers::WakerList;

// Not re-exported internals because the module name is an important identifying factor.
mod once_result;
mod wait_guard;
