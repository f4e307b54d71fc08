//! Per-key chatter filter
//!
//! Tracks the last accepted timestamp for every (key, direction) pair and
//! vetoes events that follow the previous accepted one by less than the
//! threshold. Press and release timelines are independent.

use crate::keyboard::{KeyCode, KeyEvent, KeyEventType, Verdict};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Suppressed events for one key since the last counter reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppressionTally {
    pub press: u64,
    pub release: u64,
}

impl SuppressionTally {
    pub fn total(&self) -> u64 {
        self.press + self.release
    }
}

#[derive(Debug, Default)]
struct History {
    last_press: HashMap<KeyCode, u64>,
    last_release: HashMap<KeyCode, u64>,
    suppressed: u64,
    per_key: HashMap<KeyCode, SuppressionTally>,
}

impl History {
    fn timeline(&mut self, direction: KeyEventType) -> &mut HashMap<KeyCode, u64> {
        match direction {
            KeyEventType::Press => &mut self.last_press,
            KeyEventType::Release => &mut self.last_release,
        }
    }
}

/// Point-in-time copy of the filter counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSnapshot {
    /// Events vetoed since the last reset
    pub suppressed: u64,
    /// (key, direction) pairs with an accepted event on record
    pub tracked_keys: usize,
    /// Suppressions broken down per key
    pub per_key: Vec<(KeyCode, SuppressionTally)>,
}

/// The debounce decision core shared with the capture callback
#[derive(Debug)]
pub struct DebounceFilter {
    history: Mutex<History>,
    threshold_ms: AtomicU64,
}

impl DebounceFilter {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            history: Mutex::new(History::default()),
            threshold_ms: AtomicU64::new(threshold_ms),
        }
    }

    /// Classify one event.
    ///
    /// The first event for a (key, direction) is always accepted. Later ones
    /// are suppressed iff they arrive strictly less than the threshold after
    /// the last accepted one. Suppressed events never move the reference.
    /// A timestamp older than the reference is accepted without moving it.
    pub fn evaluate(&self, key: KeyCode, direction: KeyEventType, timestamp_ms: u64) -> Verdict {
        let threshold = self.threshold_ms.load(Ordering::Relaxed);

        let mut history = self.history.lock();
        let timeline = history.timeline(direction);

        let suppress = match timeline.get(&key) {
            Some(&last) => timestamp_ms
                .checked_sub(last)
                .is_some_and(|elapsed| elapsed < threshold),
            None => false,
        };

        if suppress {
            history.suppressed += 1;
            let tally = history.per_key.entry(key).or_default();
            match direction {
                KeyEventType::Press => tally.press += 1,
                KeyEventType::Release => tally.release += 1,
            }
            return Verdict::Suppress;
        }

        let last = timeline.entry(key).or_insert(timestamp_ms);
        *last = (*last).max(timestamp_ms);
        Verdict::PassThrough
    }

    pub fn evaluate_event(&self, event: &KeyEvent) -> Verdict {
        self.evaluate(event.key, event.event_type, event.timestamp_ms)
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms.load(Ordering::Relaxed)
    }

    /// No validation here; range checks belong to the control surface
    pub fn set_threshold_ms(&self, threshold_ms: u64) {
        self.threshold_ms.store(threshold_ms, Ordering::Relaxed);
    }

    pub fn suppressed_count(&self) -> u64 {
        self.history.lock().suppressed
    }

    /// Zero the counter (and per-key tally). History is untouched.
    pub fn reset_suppressed_count(&self) {
        let mut history = self.history.lock();
        history.suppressed = 0;
        history.per_key.clear();
    }

    /// Forget every accepted timestamp. The counter survives.
    pub fn clear_history(&self) {
        let mut history = self.history.lock();
        history.last_press.clear();
        history.last_release.clear();
    }

    /// Copy the counters; sorting happens after the lock is released
    pub fn snapshot(&self) -> FilterSnapshot {
        let mut snapshot = {
            let history = self.history.lock();
            FilterSnapshot {
                suppressed: history.suppressed,
                tracked_keys: history.last_press.len() + history.last_release.len(),
                per_key: history.per_key.iter().map(|(k, t)| (*k, *t)).collect(),
            }
        };
        snapshot
            .per_key
            .sort_by(|a, b| b.1.total().cmp(&a.1.total()).then(a.0.cmp(&b.0)));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use KeyEventType::{Press, Release};

    const A: KeyCode = KeyCode(30);
    const B: KeyCode = KeyCode(48);

    #[test]
    fn first_event_is_accepted() {
        let filter = DebounceFilter::new(100);
        assert_eq!(filter.evaluate(A, Press, 5_000), Verdict::PassThrough);
        assert_eq!(filter.evaluate(A, Release, 5_001), Verdict::PassThrough);
        assert_eq!(filter.suppressed_count(), 0);
    }

    #[test]
    fn chatter_scenario() {
        let filter = DebounceFilter::new(100);
        assert_eq!(filter.evaluate(A, Press, 0), Verdict::PassThrough);
        assert_eq!(filter.evaluate(A, Press, 50), Verdict::Suppress);
        assert_eq!(filter.suppressed_count(), 1);
        assert_eq!(filter.evaluate(A, Press, 150), Verdict::PassThrough);
        assert_eq!(filter.evaluate(A, Press, 170), Verdict::Suppress);
        assert_eq!(filter.suppressed_count(), 2);
    }

    #[test]
    fn exact_threshold_is_accepted() {
        let filter = DebounceFilter::new(100);
        filter.evaluate(A, Press, 1_000);
        assert_eq!(filter.evaluate(A, Press, 1_099), Verdict::Suppress);
        assert_eq!(filter.evaluate(A, Press, 1_100), Verdict::PassThrough);
    }

    #[test]
    fn suppressed_event_does_not_move_reference() {
        let filter = DebounceFilter::new(100);
        filter.evaluate(A, Press, 0);
        filter.evaluate(A, Press, 90);
        // Measured from 0, not from the suppressed 90
        assert_eq!(filter.evaluate(A, Press, 100), Verdict::PassThrough);
    }

    #[test]
    fn directions_are_independent() {
        let filter = DebounceFilter::new(100);
        filter.evaluate(A, Press, 0);
        assert_eq!(filter.evaluate(A, Release, 10), Verdict::PassThrough);
        assert_eq!(filter.evaluate(A, Press, 20), Verdict::Suppress);
        assert_eq!(filter.evaluate(A, Release, 30), Verdict::Suppress);
        let tally = filter.snapshot().per_key[0].1;
        assert_eq!(tally, SuppressionTally { press: 1, release: 1 });
    }

    #[test]
    fn keys_are_independent() {
        let filter = DebounceFilter::new(100);
        filter.evaluate(A, Press, 0);
        assert_eq!(filter.evaluate(B, Press, 1), Verdict::PassThrough);
    }

    #[test]
    fn clock_going_backwards_is_accepted() {
        let filter = DebounceFilter::new(100);
        filter.evaluate(A, Press, 10_000);
        assert_eq!(filter.evaluate(A, Press, 9_000), Verdict::PassThrough);
        assert_eq!(filter.suppressed_count(), 0);
        // Reference stays at 10_000
        assert_eq!(filter.evaluate(A, Press, 10_050), Verdict::Suppress);
        assert_eq!(filter.evaluate(A, Press, 10_100), Verdict::PassThrough);
    }

    #[test]
    fn large_timestamps_do_not_overflow() {
        let filter = DebounceFilter::new(u64::MAX);
        filter.evaluate(A, Press, u64::MAX - 1);
        assert_eq!(filter.evaluate(A, Press, 0), Verdict::PassThrough);
        assert_eq!(filter.evaluate(A, Press, u64::MAX), Verdict::Suppress);
    }

    #[test]
    fn threshold_change_applies_to_next_event() {
        let filter = DebounceFilter::new(100);
        filter.evaluate(A, Press, 0);
        filter.set_threshold_ms(20);
        assert_eq!(filter.threshold_ms(), 20);
        assert_eq!(filter.evaluate(A, Press, 30), Verdict::PassThrough);
    }

    #[test]
    fn reset_keeps_history() {
        let filter = DebounceFilter::new(100);
        filter.evaluate(A, Press, 0);
        filter.evaluate(A, Press, 10);
        filter.reset_suppressed_count();
        assert_eq!(filter.suppressed_count(), 0);
        assert!(filter.snapshot().per_key.is_empty());
        // Still suppressed against the reference at 0
        assert_eq!(filter.evaluate(A, Press, 20), Verdict::Suppress);
        assert_eq!(filter.suppressed_count(), 1);
    }

    #[test]
    fn clear_history_keeps_counter() {
        let filter = DebounceFilter::new(100);
        filter.evaluate(A, Press, 0);
        filter.evaluate(A, Press, 10);
        filter.clear_history();
        assert_eq!(filter.evaluate(A, Press, 20), Verdict::PassThrough);
        assert_eq!(filter.suppressed_count(), 1);
        assert_eq!(filter.snapshot().tracked_keys, 1);
    }

    #[test]
    fn snapshot_sorts_noisiest_key_first() {
        let filter = DebounceFilter::new(100);
        for key in [A, B] {
            filter.evaluate(key, Press, 0);
        }
        filter.evaluate(A, Press, 1);
        filter.evaluate(B, Press, 1);
        filter.evaluate(B, Press, 2);

        let snapshot = filter.snapshot();
        assert_eq!(snapshot.suppressed, 3);
        assert_eq!(snapshot.tracked_keys, 2);
        assert_eq!(snapshot.per_key[0].0, B);
        assert_eq!(snapshot.per_key[0].1.total(), 2);
    }

    #[test]
    fn concurrent_evaluation_loses_no_increments() {
        let filter = DebounceFilter::new(1_000);
        std::thread::scope(|s| {
            for code in 0..8u16 {
                let filter = &filter;
                s.spawn(move || {
                    for t in 0..100u64 {
                        filter.evaluate(KeyCode(code), Press, t);
                    }
                });
            }
        });
        // Each key: first accepted, 99 suppressed
        assert_eq!(filter.suppressed_count(), 8 * 99);
    }

    #[test]
    fn reset_between_concurrent_batches_loses_nothing() {
        let filter = DebounceFilter::new(1_000);
        let reset_point = Barrier::new(9);
        let resumed = Barrier::new(9);

        let after_reset: u64 = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8u16)
                .map(|code| {
                    let (filter, reset_point, resumed) = (&filter, &reset_point, &resumed);
                    s.spawn(move || {
                        for t in 0..50u64 {
                            filter.evaluate(KeyCode(code), Press, t);
                        }
                        reset_point.wait();
                        resumed.wait();
                        (50..100u64)
                            .filter(|&t| filter.evaluate(KeyCode(code), Press, t).is_suppress())
                            .count() as u64
                    })
                })
                .collect();

            reset_point.wait();
            filter.reset_suppressed_count();
            resumed.wait();
            workers.into_iter().map(|w| w.join().unwrap()).sum()
        });

        assert_eq!(after_reset, 8 * 50);
        assert_eq!(filter.suppressed_count(), after_reset);
    }

    #[test]
    fn snapshot_while_evaluating() {
        let filter = DebounceFilter::new(1_000);
        std::thread::scope(|s| {
            s.spawn(|| {
                for t in 0..500u64 {
                    filter.evaluate(KeyCode((t % 5) as u16), Press, t);
                }
            });
            for _ in 0..50 {
                let snapshot = filter.snapshot();
                let per_key_total: u64 = snapshot.per_key.iter().map(|(_, t)| t.total()).sum();
                assert_eq!(per_key_total, snapshot.suppressed);
                assert!(snapshot
                    .per_key
                    .windows(2)
                    .all(|w| w[0].1.total() >= w[1].1.total()));
            }
        });
        assert_eq!(filter.snapshot().suppressed, 495);
    }
}
