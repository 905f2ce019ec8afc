// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test support for the offramp workspace: a watchdog for test logic that could hang forever, and
//! console logging wiring for examples and tests.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing_appender::non_blocking::WorkerGuard;

/// If something (whatever) does not happen in a test within this time, the test will fail.
///
/// We are conservative here and allow much time - this is only to break out of infinite waits on
/// results that will never arrive, not for any situations that are actually expected.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes a thread-safe function on a background thread and abandons it if it does not complete
/// before [`TEST_TIMEOUT`].
///
/// Returns `None` if the function timed out or panicked, in which case the caller should fail the
/// test. The abandoned thread is left to its fate - tests using this helper must not rely on it
/// ever finishing.
#[must_use]
pub fn execute_or_abandon<F, R>(f: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (result_tx, result_rx) = mpsc::channel();

    // There are two ways for the called function to fail:
    // 1. It does not finish in the allowed time span.
    // 2. It panics, so the result is never sent.
    //
    // In both cases the channel ends up with no value to deliver and recv_timeout reports an
    // error, which we collapse into None.
    thread::spawn(move || {
        let result = f();

        // The receiver disappears if the caller already gave up waiting on us.
        _ = result_tx.send(result);
    });

    result_rx.recv_timeout(TEST_TIMEOUT).ok()
}

/// Wires up an asynchronous console log output, intended for use in examples and tests. The
/// returned guard will ensure that all contents are flushed on drop, ensuring test isolation.
///
/// # Panics
///
/// Panics if logging has already been configured for this process. Logging can only be configured
/// once per process, so tests using this capability need a process-per-test runner such as
/// nextest, or have to run one at a time.
pub fn log_to_console() -> WorkerGuard {
    let (non_blocking_stdout, guard) = tracing_appender::non_blocking(std::io::stdout());

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(non_blocking_stdout)
        .try_init()
        .expect("logging already configured - run tests that log in their own process");

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_function_returns_its_value() {
        assert_eq!(execute_or_abandon(|| 42), Some(42));
    }

    #[test]
    fn panicking_function_returns_none() {
        let result: Option<()> = execute_or_abandon(|| panic!("deliberate test panic"));

        assert!(result.is_none());
    }
}
