//! Cancellable timers for the single-threaded event loop
//!
//! Scheduling returns a [`TimerGuard`]; the pending event is cancelled when
//! the guard is cancelled or dropped, so an owner that drops its guard on
//! every exit path can never receive a stale callback.
//!
//! Time is virtual: the loop calls [`Scheduler::advance_to`] with the elapsed
//! time since start and receives the events that became due, in deadline
//! order. Tests drive the same API with hand-picked durations.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TimerId(u64);

#[derive(Debug)]
struct Entry<E> {
    id: TimerId,
    deadline: Duration,
    event: E,
}

#[derive(Debug)]
struct TimerQueue<E> {
    now: Duration,
    next_id: u64,
    pending: Vec<Entry<E>>,
}

impl<E> TimerQueue<E> {
    fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|entry| entry.id != id);
        self.pending.len() != before
    }
}

/// Shared handle to the timer queue
///
/// Clones refer to the same queue.
#[derive(Debug)]
pub struct Scheduler<E> {
    queue: Rc<RefCell<TimerQueue<E>>>,
}

impl<E> Clone for Scheduler<E> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(TimerQueue {
                now: Duration::ZERO,
                next_id: 1,
                pending: Vec::new(),
            })),
        }
    }

    /// Schedules `event` to fire `delay` after the current time
    #[must_use = "dropping the guard cancels the timer"]
    pub fn schedule(&self, delay: Duration, event: E) -> TimerGuard<E> {
        let mut queue = self.queue.borrow_mut();
        let id = TimerId(queue.next_id);
        queue.next_id += 1;
        let deadline = queue.now + delay;
        queue.pending.push(Entry {
            id,
            deadline,
            event,
        });

        TimerGuard {
            id,
            queue: Rc::downgrade(&self.queue),
        }
    }

    /// Moves the clock forward and returns the events that are now due
    ///
    /// Events are ordered by deadline, then by scheduling order. Time never
    /// goes backwards; an earlier `now` is ignored.
    pub fn advance_to(&self, now: Duration) -> Vec<E> {
        let mut queue = self.queue.borrow_mut();
        if now > queue.now {
            queue.now = now;
        }
        let now = queue.now;

        let (mut due, pending): (Vec<_>, Vec<_>) = queue
            .pending
            .drain(..)
            .partition(|entry| entry.deadline <= now);
        queue.pending = pending;

        due.sort_by_key(|entry| (entry.deadline, entry.id));
        due.into_iter().map(|entry| entry.event).collect()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    /// Earliest pending deadline, if any timer is armed
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue
            .borrow()
            .pending
            .iter()
            .map(|entry| entry.deadline)
            .min()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.borrow().pending.len()
    }
}

/// Scoped ownership of a pending timer
#[derive(Debug)]
pub struct TimerGuard<E> {
    id: TimerId,
    queue: Weak<RefCell<TimerQueue<E>>>,
}

impl<E> TimerGuard<E> {
    /// Returns true while the timer has neither fired nor been cancelled
    pub fn is_pending(&self) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };
        let queue = queue.borrow();
        queue.pending.iter().any(|entry| entry.id == self.id)
    }

    /// Cancels the timer; returns false if it already fired
    pub fn cancel(self) -> bool {
        self.cancel_pending()
    }

    fn cancel_pending(&self) -> bool {
        match self.queue.upgrade() {
            Some(queue) => match queue.try_borrow_mut() {
                Ok(mut queue) => queue.cancel(self.id),
                Err(_) => false,
            },
            None => false,
        }
    }
}

impl<E> Drop for TimerGuard<E> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_when_deadline_reached() {
        let scheduler = Scheduler::new();
        let guard = scheduler.schedule(50 * MS, "settle");

        assert!(scheduler.advance_to(49 * MS).is_empty());
        assert!(guard.is_pending());
        assert_eq!(scheduler.advance_to(50 * MS), vec!["settle"]);
        assert!(!guard.is_pending());
    }

    #[test]
    fn events_come_out_in_deadline_order() {
        let scheduler = Scheduler::new();
        let _a = scheduler.schedule(30 * MS, 'a');
        let _b = scheduler.schedule(10 * MS, 'b');
        let _c = scheduler.schedule(10 * MS, 'c');
        assert_eq!(scheduler.advance_to(100 * MS), vec!['b', 'c', 'a']);
    }

    #[test]
    fn delay_is_relative_to_current_time() {
        let scheduler = Scheduler::new();
        scheduler.advance_to(1000 * MS);
        let _guard = scheduler.schedule(1000 * MS, 1);
        assert_eq!(scheduler.next_deadline(), Some(2000 * MS));
        assert!(scheduler.advance_to(1999 * MS).is_empty());
        assert_eq!(scheduler.advance_to(2000 * MS), vec![1]);
    }

    #[test]
    fn dropping_guard_cancels() {
        let scheduler = Scheduler::new();
        {
            let _guard = scheduler.schedule(10 * MS, ());
            assert_eq!(scheduler.pending_count(), 1);
        }
        assert_eq!(scheduler.pending_count(), 0);
        assert!(scheduler.advance_to(20 * MS).is_empty());
    }

    #[test]
    fn explicit_cancel_reports_whether_pending() {
        let scheduler = Scheduler::new();
        let guard = scheduler.schedule(10 * MS, ());
        assert!(guard.cancel());

        let fired = scheduler.schedule(10 * MS, ());
        scheduler.advance_to(10 * MS);
        assert!(!fired.cancel());
    }

    #[test]
    fn clock_never_goes_backwards() {
        let scheduler: Scheduler<()> = Scheduler::new();
        scheduler.advance_to(500 * MS);
        scheduler.advance_to(100 * MS);
        assert_eq!(scheduler.now(), 500 * MS);
    }

    #[test]
    fn guard_outliving_scheduler_is_harmless() {
        let guard = {
            let scheduler = Scheduler::new();
            scheduler.schedule(10 * MS, 0u8)
        };
        assert!(!guard.is_pending());
        drop(guard);
    }
}
