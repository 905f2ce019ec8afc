// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{self, Waker};

use crate::{ERR_POISONED_LOCK, Error, WakerList};

/// Creates the single-assignment result cell backing one blocking invocation.
///
/// Usage:
///
/// 1. Obtain a sender and receiver pair via this function.
/// 2. Record the outcome at most once through the sender; consume it at most once through the
///    receiver.
///
/// The outcome is delivered instantly via waker if a waiter is already suspended, and instantly on
/// the next poll if the waiter starts after the outcome was recorded - a wakeup can never be lost
/// in between.
///
/// # Dropped senders
///
/// If the sender is destroyed without recording an outcome, the receiver resolves to
/// [`Error::WorkerLost`] instead of suspending its caller forever. The dispatcher captures every
/// failure mode of the callable, so this is a defensive backstop rather than an expected path.
///
/// # Thread safety
///
/// The sender and receiver may be on any thread - this is a thread-safe cell. The intended split
/// is one writer on the worker thread and one reader on the scheduler side.
pub(crate) fn channel<T>() -> (OutcomeSender<T>, OutcomeReceiver<T>) {
    let cell = Arc::new(OnceResult {
        state: Mutex::new(CellState::Pending(WakerList::new())),
    });

    (
        OutcomeSender {
            cell: Arc::clone(&cell),
        },
        OutcomeReceiver { cell },
    )
}

/// A thread-safe cell holding the eventual outcome of one blocking invocation.
///
/// The state advances exactly once out of `Pending`, and the value and error sides of the outcome
/// are mutually exclusive and immutable once recorded.
#[derive(Debug)]
struct OnceResult<T> {
    state: Mutex<CellState<T>>,
}

impl<T> OnceResult<T> {
    /// Records the outcome and wakes every waiter registered so far, in registration order.
    ///
    /// # Panics
    ///
    /// Panics if an outcome was already recorded. A second completion indicates a dispatcher bug
    /// and must fail loudly rather than silently overwrite the first outcome.
    #[cfg_attr(test, mutants::skip)] // Critical primitive - causes test timeouts if tampered.
    fn set(&self, outcome: crate::Result<T>) {
        let waiters;

        {
            let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

            match &*state {
                CellState::Pending(_) => {
                    let previous_state = mem::replace(&mut *state, CellState::Ready(outcome));

                    drop(state);

                    match previous_state {
                        CellState::Pending(list) => waiters = list,
                        _ => unreachable!("we are re-matching an already matched pattern"),
                    }
                }
                CellState::Ready(_) => {
                    panic!("outcome already recorded for this invocation");
                }
                CellState::Consumed => {
                    panic!("outcome already recorded and consumed for this invocation");
                }
            }
        }

        // We perform the wakeups outside the lock to avoid unnecessary contention if a waiter
        // resumes instantly and we have not released our lock yet.
        waiters.wake_all();
    }

    // We are intended to be polled via Future::poll, so we have an equivalent signature here.
    #[cfg_attr(test, mutants::skip)] // Critical for code execution to occur in async contexts.
    fn poll(&self, waker: &Waker) -> Option<crate::Result<T>> {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        match &mut *state {
            CellState::Pending(waiters) => {
                waiters.register(waker);
                None
            }
            CellState::Ready(_) => {
                let previous_state = mem::replace(&mut *state, CellState::Consumed);

                drop(state);

                match previous_state {
                    CellState::Ready(outcome) => Some(outcome),
                    _ => unreachable!("we are re-matching an already matched pattern"),
                }
            }
            CellState::Consumed => {
                // We do not keep a copy of the outcome around, so we can only return it once.
                // The Future API contract allows us to panic in this situation.
                panic!("result cell polled after its outcome was already consumed");
            }
        }
    }

    /// The writer disappeared. If no outcome was recorded, resolve waiters with a failure so
    /// nobody suspends forever; otherwise there is nothing to do.
    fn writer_lost(&self) {
        let waiters;

        {
            let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

            match &*state {
                CellState::Pending(_) => {
                    let previous_state =
                        mem::replace(&mut *state, CellState::Ready(Err(Error::WorkerLost)));

                    drop(state);

                    match previous_state {
                        CellState::Pending(list) => waiters = list,
                        _ => unreachable!("we are re-matching an already matched pattern"),
                    }
                }
                _ => return,
            }
        }

        waiters.wake_all();
    }
}

/// The write half of a result cell.
///
/// Each invocation's worker thread is the sole writer. Completion consumes the sender, so a second
/// completion through the public surface is unrepresentable; the state machine underneath still
/// fails loudly if it is ever driven into one.
#[derive(Debug)]
pub(crate) struct OutcomeSender<T> {
    cell: Arc<OnceResult<T>>,
}

impl<T> OutcomeSender<T> {
    /// Records a successful outcome and wakes the registered waiters.
    #[cfg_attr(test, mutants::skip)] // Critical primitive - causes test timeouts if tampered.
    pub fn fulfill(self, value: T) {
        self.cell.set(Ok(value));
    }

    /// Records a failure outcome and wakes the registered waiters.
    #[cfg_attr(test, mutants::skip)] // Critical primitive - causes test timeouts if tampered.
    pub fn fail(self, error: Error) {
        self.cell.set(Err(error));
    }
}

impl<T> Drop for OutcomeSender<T> {
    fn drop(&mut self) {
        self.cell.writer_lost();
    }
}

/// The read half of a result cell.
///
/// Resolves with the recorded outcome; an outcome recorded before the first poll is returned
/// without ever suspending. If the awaiting coroutine is dropped instead, the cell completes
/// normally on the worker side and the outcome is discarded - that is a no-op, not an error.
#[derive(Debug)]
pub(crate) struct OutcomeReceiver<T> {
    cell: Arc<OnceResult<T>>,
}

impl<T> Future for OutcomeReceiver<T> {
    type Output = crate::Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> task::Poll<Self::Output> {
        self.cell
            .poll(cx.waker())
            .map_or(task::Poll::Pending, task::Poll::Ready)
    }
}

#[derive(Debug)]
enum CellState<T> {
    /// No outcome has been recorded; holds the waiters registered so far, in registration order.
    Pending(WakerList),

    /// The outcome has been recorded but nobody has consumed it yet.
    Ready(crate::Result<T>),

    /// The outcome has been recorded and handed to the awaiting caller.
    Consumed,
}
