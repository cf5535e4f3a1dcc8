//! One-request-per-tick work queue
//!
//! The managers in this crate all budget their structural work the same
//! way: requests queue up in arrival order and exactly one is taken per
//! tick, never while another is mid-process. This spreads generation
//! spikes (dozens of stages, enemies, skins) across frames instead of
//! stalling one.
//!
//! This is a budgeting device, not a thread pool: handlers run to
//! completion synchronously inside the tick. Handlers are infallible by
//! construction; the in-process flag exists to make re-entrancy a
//! visible bug rather than a silent reorder.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Lifecycle of a budgeted manager. Managers stay in a working state
/// across ticks and fall back to `Idle` when the last step completes;
/// dependents gate on `Idle` rather than on callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessStatus {
    #[default]
    Idle,
    Generating,
    Starting,
    Resetting,
}

/// FIFO request queue with an at-most-one-in-flight guarantee.
#[derive(Debug)]
pub struct RequestQueue<T> {
    pending: VecDeque<T>,
    in_process: bool,
}

impl<T> Default for RequestQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            in_process: false,
        }
    }

    /// Queue a request behind any already waiting.
    pub fn enqueue(&mut self, request: T) {
        self.pending.push_back(request);
    }

    /// Take the front request for processing this tick.
    ///
    /// Returns `None` when the queue is empty or a request is already
    /// mid-process. The caller must pair every `Some` with a
    /// [`RequestQueue::finish`] once its handler returns.
    #[must_use]
    pub fn begin(&mut self) -> Option<T> {
        if self.in_process {
            return None;
        }
        let request = self.pending.pop_front()?;
        self.in_process = true;
        Some(request)
    }

    /// Mark the in-flight request done.
    pub fn finish(&mut self) {
        debug_assert!(self.in_process, "finish() without a matching begin()");
        self.in_process = false;
    }

    /// Drop all pending requests. In-flight work is unaffected; each
    /// step completes atomically within its tick.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// True while a request taken by [`RequestQueue::begin`] has not
    /// been finished.
    pub fn is_processing(&self) -> bool {
        self.in_process
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fifo_one_per_tick() {
        let mut queue = RequestQueue::new();
        for i in 0..5 {
            queue.enqueue(i);
        }

        let mut processed = Vec::new();
        for _ in 0..5 {
            let item = queue.begin().unwrap();
            assert!(queue.is_processing());
            processed.push(item);
            queue.finish();
            assert!(!queue.is_processing());
        }

        assert_eq!(processed, vec![0, 1, 2, 3, 4]);
        assert!(queue.begin().is_none());
    }

    #[test]
    fn test_no_second_request_while_in_process() {
        let mut queue = RequestQueue::new();
        queue.enqueue('a');
        queue.enqueue('b');

        let first = queue.begin().unwrap();
        assert_eq!(first, 'a');
        // Re-entrant begin must refuse while 'a' is unfinished
        assert!(queue.begin().is_none());
        queue.finish();
        assert_eq!(queue.begin().unwrap(), 'b');
        queue.finish();
    }

    #[test]
    fn test_clear_drops_pending_only() {
        let mut queue = RequestQueue::new();
        queue.enqueue(1);
        queue.enqueue(2);

        let in_flight = queue.begin().unwrap();
        queue.clear();
        assert_eq!(in_flight, 1);
        assert!(queue.is_processing());
        queue.finish();
        assert!(queue.begin().is_none());
    }

    proptest! {
        /// K enqueues and K ticks process exactly K items, in order,
        /// with the flag down between ticks.
        #[test]
        fn prop_k_ticks_drain_k_items(items in proptest::collection::vec(any::<u32>(), 0..64)) {
            let mut queue = RequestQueue::new();
            for &item in &items {
                queue.enqueue(item);
            }

            let mut drained = Vec::new();
            for _ in 0..items.len() {
                prop_assert!(!queue.is_processing());
                let item = queue.begin().unwrap();
                drained.push(item);
                queue.finish();
            }

            prop_assert_eq!(drained, items);
            prop_assert!(queue.is_empty());
        }
    }
}
