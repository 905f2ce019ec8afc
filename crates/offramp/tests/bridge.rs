// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use futures::executor::{LocalPool, block_on};
use futures::task::LocalSpawnExt;
use offramp::{Bridged, Dispatcher, Error};
use offramp_testing::execute_or_abandon;
use static_assertions::assert_impl_all;

assert_impl_all!(Bridged<fn() -> u32>: Send, Sync, Clone);

#[test]
fn wrapped_callable_is_reusable() {
    let (first, second, invocations) = execute_or_abandon(|| {
        let dispatcher = Dispatcher::new();
        let invocations = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&invocations);
        let bridged = dispatcher.bridge(move || counter.fetch_add(1, Ordering::SeqCst));

        let first = block_on(bridged.call());
        let second = block_on(bridged.call());

        (first, second, invocations.load(Ordering::SeqCst))
    })
    .expect("test timed out");

    assert_eq!(first.expect("the first invocation does not fail"), 0);
    assert_eq!(second.expect("the second invocation does not fail"), 1);
    assert_eq!(invocations, 2);
}

#[test]
fn concurrent_invocations_produce_independent_outcomes() {
    let (elapsed, mut tickets) = execute_or_abandon(|| {
        let dispatcher = Dispatcher::new();
        let next_ticket = Arc::new(AtomicUsize::new(0));

        let bridged = dispatcher.bridge(move || {
            let ticket = next_ticket.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(200));

            ticket
        });

        let start = Instant::now();

        let results = block_on(async {
            futures::join!(bridged.call(), bridged.call(), bridged.call())
        });

        let tickets = [
            results.0.expect("the first invocation does not fail"),
            results.1.expect("the second invocation does not fail"),
            results.2.expect("the third invocation does not fail"),
        ];

        (start.elapsed(), tickets)
    })
    .expect("test timed out");

    // Every awaiting coroutine received its own distinct outcome.
    tickets.sort_unstable();
    assert_eq!(tickets, [0, 1, 2]);

    // And the three invocations overlapped instead of queuing up behind each other.
    assert!(
        elapsed < Duration::from_millis(500),
        "invocations appear to have run sequentially, taking {elapsed:?}"
    );
}

#[test]
fn scheduler_keeps_running_while_the_call_is_offloaded() {
    let (outcome, ticks) = execute_or_abandon(|| {
        let dispatcher = Dispatcher::new();

        let fetch = dispatcher.bridge(|| {
            thread::sleep(Duration::from_millis(150));
            42
        });

        let pause = dispatcher.bridge(|| thread::sleep(Duration::from_millis(10)));

        let mut pool = LocalPool::new();
        let ticks = Rc::new(Cell::new(0_usize));

        let tick_count = Rc::clone(&ticks);
        pool.spawner()
            .spawn_local(async move {
                loop {
                    pause.call().await.expect("the pause callable does not fail");
                    tick_count.set(tick_count.get() + 1);
                }
            })
            .expect("spawning on a fresh pool cannot fail");

        let outcome = pool.run_until(fetch.call());

        (outcome, ticks.get())
    })
    .expect("test timed out");

    assert_eq!(outcome.expect("the fetch does not fail"), 42);
    assert!(
        ticks >= 1,
        "the repeating task should have made progress during the offloaded wait"
    );
}

#[test]
fn failure_does_not_poison_the_scheduler() {
    let (first, second) = execute_or_abandon(|| {
        let dispatcher = Dispatcher::new();

        let explosive = dispatcher.bridge(|| -> u32 { panic!("boom") });

        let mut pool = LocalPool::new();

        let first = pool.run_until(explosive.call());

        // Both the scheduler and the dispatcher must remain usable after the failure.
        let second = pool.run_until(dispatcher.run_blocking(|| 7));

        (first, second)
    })
    .expect("test timed out");

    match first {
        Err(Error::BlockingCallFailed { message }) => assert_eq!(message, "boom"),
        other => panic!("expected a captured panic, got {other:?}"),
    }

    assert_eq!(second.expect("the follow-up call does not fail"), 7);
}

#[test]
fn clones_share_the_wrapped_callable() {
    let invocations = execute_or_abandon(|| {
        let dispatcher = Dispatcher::new();
        let invocations = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&invocations);
        let original = dispatcher.bridge(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let clone = original.clone();

        block_on(original.call()).expect("the original does not fail");
        block_on(clone.call()).expect("the clone does not fail");

        invocations.load(Ordering::SeqCst)
    })
    .expect("test timed out");

    assert_eq!(invocations, 2);
}
