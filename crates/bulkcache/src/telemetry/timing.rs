// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, Instant};

use tick::Clock;

/// Measures elapsed time on the engine's clock, so tests with a controlled clock see exact durations.
#[derive(Debug)]
pub(crate) struct Stopwatch<'a> {
    clock: &'a Clock,
    started: Instant,
}

impl<'a> Stopwatch<'a> {
    pub(crate) fn start(clock: &'a Clock) -> Self {
        Self {
            clock,
            started: clock.instant(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.clock.instant().saturating_duration_since(self.started)
    }
}
