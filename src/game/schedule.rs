// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use log::debug;
use web_time::Instant;

/// A computer move waiting to be played. `version` is the play state
/// version the move was scheduled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scheduled {
    pub version: u64,
    pub due: Instant,
}

/// Holds at most one deferred computer move.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Option<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was pending.
    pub fn schedule(&mut self, version: u64, due: Instant) {
        debug!("computer move scheduled for version {version}");
        self.pending = Some(Scheduled { version, due });
    }

    pub fn cancel(&mut self) -> Option<Scheduled> {
        let cancelled = self.pending.take();
        if let Some(scheduled) = cancelled {
            debug!("computer move for version {} cancelled", scheduled.version);
        }
        cancelled
    }

    #[inline]
    pub fn pending(&self) -> Option<Scheduled> {
        self.pending
    }

    #[inline]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|scheduled| scheduled.due)
    }

    /// Removes and returns the pending entry once `now` has reached its
    /// due time. Entries that are not yet due stay put.
    pub fn take_due(&mut self, now: Instant) -> Option<Scheduled> {
        match self.pending {
            Some(scheduled) if now >= scheduled.due => self.pending.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use std::time::Duration;
    use web_time::Instant;

    #[test]
    fn test_take_due_waits_for_deadline() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(3, start + Duration::from_millis(500));
        assert_eq!(scheduler.take_due(start), None);
        assert_eq!(scheduler.take_due(start + Duration::from_millis(499)), None);
        let fired = scheduler.take_due(start + Duration::from_millis(500)).unwrap();
        assert_eq!(fired.version, 3);
        assert_eq!(scheduler.pending(), None);
        assert_eq!(scheduler.take_due(start + Duration::from_secs(5)), None);
    }
    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.cancel(), None);
        scheduler.schedule(1, start);
        assert_eq!(scheduler.next_deadline(), Some(start));
        assert!(scheduler.cancel().is_some());
        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(scheduler.take_due(start), None);
    }
    #[test]
    fn test_schedule_replaces_pending() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1, start);
        scheduler.schedule(2, start + Duration::from_millis(10));
        let pending = scheduler.pending().unwrap();
        assert_eq!(pending.version, 2);
        assert_eq!(pending.due, start + Duration::from_millis(10));
    }
}
