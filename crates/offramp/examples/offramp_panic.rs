// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Validate that when an offloaded call panics, the caller sees an error at the await point,
// as opposed to the worker thread tearing down the process or hanging the caller forever.

use offramp::{Dispatcher, JoinHandle};

fn main() {
    let dispatcher = Dispatcher::new();

    let mut handle: JoinHandle<()> =
        dispatcher.run_blocking(|| panic!("this panic is expected to surface as an error"));

    match handle.wait() {
        Ok(()) => println!("unexpected success"),
        Err(error) => println!("offloaded call failed as expected: {error}"),
    }
}
