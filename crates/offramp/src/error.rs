// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// A specialized `Result` type for offramp operations
/// that return an offramp [`Error`][enum@Error] on failure.
pub type Result<T> = std::result::Result<T, Error>;

/// An error surfaced when awaiting the outcome of an offloaded blocking call.
///
/// Failures on the worker thread are always captured and delivered through this type at the await
/// point, exactly where a synchronous call would have raised them. A worker thread never crashes
/// the process and an offloaded invocation never hangs its awaiting caller.
///
/// Double completion of a result cell is not represented here - it indicates a dispatcher bug and
/// is treated as a fatal programming error (panic) rather than a recoverable condition.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The blocking callable panicked while executing on its worker thread. The panic was captured
    /// there and converted into this failure; the message carries the panic payload when it is a
    /// string.
    #[error("blocking call failed: {message}")]
    BlockingCallFailed {
        /// The panic payload, or a placeholder when the payload was not a string.
        message: String,
    },

    /// The worker thread went away without recording an outcome. The dispatcher's capture logic
    /// makes this unreachable in normal operation, but an awaiting caller must observe a failure
    /// rather than suspend forever if it ever happens.
    #[error("worker thread exited without recording an outcome")]
    WorkerLost,

    /// We are re-packaging an error from the Rust standard library
    /// without adding further details in the offramp layer.
    ///
    /// In practice this means the operating system refused to start a worker thread.
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}
