// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// We only take these locks for a few statements at a time and never panic while holding one, so
/// poisoning implies memory corruption or similar - there is nothing sensible left to do.
pub(crate) const ERR_POISONED_LOCK: &str = "result cell lock was poisoned by a panicking thread";
