// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Offloads a slow "fetch" onto a worker thread while a repeating task shows that the scheduler
// keeps making progress during the wait - calling the fetch synchronously would have frozen both.

use std::thread;
use std::time::Duration;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use offramp::Dispatcher;

fn main() {
    let _log_guard = offramp_testing::log_to_console();

    let dispatcher = Dispatcher::new();

    let fetch = dispatcher.bridge(|| {
        thread::sleep(Duration::from_millis(300));
        "a result fetched off-loop"
    });

    let pause = dispatcher.bridge(|| thread::sleep(Duration::from_millis(50)));

    let mut pool = LocalPool::new();

    pool.spawner()
        .spawn_local(async move {
            for beat in 1.. {
                println!("other task is alive (beat {beat})");
                pause.call().await.expect("the pause callable does not fail");
            }
        })
        .expect("spawning on a fresh pool cannot fail");

    let outcome = pool.run_until(fetch.call());

    println!("fetch returned: {}", outcome.expect("the fetch does not fail"));
}
