//! Cancellable timer arena.
//!
//! Each view owns one `Timers` value and polls it from the event loop. Nothing
//! runs on its own: `fire_due` hands back the events whose deadline passed and
//! the owner applies them. Dropping the owner drops every pending task.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Scheduled<E> {
    id: TimerId,
    due: Instant,
    period: Option<Duration>,
    event: E,
}

#[derive(Debug)]
pub struct Timers<E> {
    next_id: u64,
    tasks: Vec<Scheduled<E>>,
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<E: Clone> Timers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, now: Instant, delay: Duration, event: E) -> TimerId {
        self.push(now + delay, None, event)
    }

    /// A zero period would never advance, so it is clamped to one millisecond.
    pub fn schedule_every(&mut self, now: Instant, period: Duration, event: E) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.push(now + period, Some(period), event)
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|task| task.due).min()
    }

    /// Returns the events of every task due at `now`, earliest deadline first.
    /// Periodic tasks emit once per elapsed period and stay armed.
    pub fn fire_due(&mut self, now: Instant) -> Vec<E> {
        let mut fired: Vec<(Instant, TimerId, E)> = Vec::new();

        self.tasks.retain_mut(|task| {
            if task.due > now {
                return true;
            }
            match task.period {
                Some(period) => {
                    while task.due <= now {
                        fired.push((task.due, task.id, task.event.clone()));
                        task.due += period;
                    }
                    true
                }
                None => {
                    fired.push((task.due, task.id, task.event.clone()));
                    false
                }
            }
        });

        fired.sort_by_key(|(due, id, _)| (*due, *id));
        fired.into_iter().map(|(_, _, event)| event).collect()
    }

    fn push(&mut self, due: Instant, period: Option<Duration>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Scheduled {
            id,
            due,
            period,
            event,
        });
        id
    }
}
