//! Timed world events without coroutines.
//!
//! Scheduled callbacks are plain records advanced once per tick inside the
//! single-threaded loop; fired events are returned to the caller, which
//! dispatches them itself.

use tracing::warn;

/// One scheduled entry.
#[derive(Clone, Debug)]
struct Entry<E> {
    remaining: f32,
    period: f32,
    /// `None` repeats forever.
    repeats_left: Option<u32>,
    event: E,
}

/// Advances timed events once per tick.
#[derive(Default)]
pub struct Scheduler<E> {
    entries: Vec<Entry<E>>,
}

impl<E: Clone> Scheduler<E> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Fire an event once after `delay` seconds.
    pub fn after(&mut self, delay: f32, event: E) {
        self.entries.push(Entry {
            remaining: delay,
            period: delay,
            repeats_left: Some(1),
            event,
        });
    }

    /// Fire an event every `period` seconds forever.
    ///
    /// A non-positive period is dropped; the catch-up loop in
    /// [`Scheduler::tick`] could never drain it.
    pub fn every(&mut self, period: f32, event: E) {
        if period <= 0.0 {
            warn!(period, "dropping periodic entry with non-positive period");
            return;
        }
        self.entries.push(Entry {
            remaining: period,
            period,
            repeats_left: None,
            event,
        });
    }

    /// Fire an event every `period` seconds, `times` times in total.
    /// Zero times is a no-op. A non-positive period is dropped.
    pub fn repeat(&mut self, period: f32, times: u32, event: E) {
        if period <= 0.0 {
            warn!(period, "dropping periodic entry with non-positive period");
            return;
        }
        self.entries.push(Entry {
            remaining: period,
            period,
            repeats_left: Some(times),
            event,
        });
    }

    /// Advance all entries by `dt` and collect fired events.
    ///
    /// A large `dt` can fire a periodic entry several times in one tick.
    pub fn tick(&mut self, dt: f32) -> Vec<E> {
        let mut fired = Vec::new();

        for entry in &mut self.entries {
            entry.remaining -= dt;
            // An exhausted entry must not fire again; checking before the
            // decrement also keeps the counter from underflowing.
            while entry.remaining <= 0.0 && entry.repeats_left != Some(0) {
                fired.push(entry.event.clone());

                if let Some(left) = entry.repeats_left.as_mut() {
                    *left -= 1;
                }
                entry.remaining += entry.period;
            }
        }

        self.entries.retain(|e| e.repeats_left != Some(0));
        fired
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum TestEvent {
        Ping,
        Pong,
    }

    #[test]
    fn one_shot_fires_once() {
        let mut scheduler = Scheduler::new();
        scheduler.after(1.0, TestEvent::Ping);

        assert!(scheduler.tick(0.5).is_empty());
        assert_eq!(scheduler.tick(0.6), vec![TestEvent::Ping]);
        assert!(scheduler.tick(10.0).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn periodic_fires_repeatedly() {
        let mut scheduler = Scheduler::new();
        scheduler.every(1.0, TestEvent::Ping);

        let mut total = 0;
        for _ in 0..10 {
            total += scheduler.tick(0.5).len();
        }
        assert_eq!(total, 5);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn bounded_repeats_expire() {
        let mut scheduler = Scheduler::new();
        scheduler.repeat(1.0, 3, TestEvent::Pong);

        let mut total = 0;
        for _ in 0..10 {
            total += scheduler.tick(1.0).len();
        }
        assert_eq!(total, 3);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn large_tick_fires_multiple_times() {
        let mut scheduler = Scheduler::new();
        scheduler.every(1.0, TestEvent::Ping);

        assert_eq!(scheduler.tick(3.5).len(), 3);
    }

    #[test]
    fn zero_repeats_never_fire() {
        let mut scheduler = Scheduler::new();
        scheduler.repeat(1.0, 0, TestEvent::Ping);

        assert!(scheduler.tick(5.0).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn non_positive_period_is_dropped() {
        let mut scheduler = Scheduler::new();
        scheduler.every(0.0, TestEvent::Ping);
        scheduler.repeat(-1.0, 3, TestEvent::Pong);

        assert!(scheduler.is_empty());
        assert!(scheduler.tick(10.0).is_empty());
    }

    #[test]
    fn independent_entries() {
        let mut scheduler = Scheduler::new();
        scheduler.every(1.0, TestEvent::Ping);
        scheduler.after(2.0, TestEvent::Pong);

        let fired = scheduler.tick(2.0);
        assert_eq!(
            fired.iter().filter(|e| **e == TestEvent::Ping).count(),
            2
        );
        assert_eq!(
            fired.iter().filter(|e| **e == TestEvent::Pong).count(),
            1
        );
    }
}
