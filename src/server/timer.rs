//! Question countdown.
//!
//! The countdown itself lives in the coordinator's event loop: the scheduler
//! only feeds `Event::Tick` messages tagged with a generation number. Each
//! `start` bumps the generation, so a tick that was already queued by a
//! cancelled countdown is recognised as stale and dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::protocol::QUESTION_DURATION_SECS;

use super::coordinator::Event;

/// Something that delivers countdown ticks back to the event loop.
pub trait TickScheduler: Send {
    /// Deliver `ticks` ticks for `generation`, one per period.
    fn schedule(&mut self, generation: u64, ticks: u32);

    /// Stop delivering ticks for the current schedule.
    fn cancel(&mut self);
}

/// Tick scheduler backed by a tokio interval task.
pub struct IntervalScheduler {
    events: mpsc::UnboundedSender<Event>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl IntervalScheduler {
    pub fn new(events: mpsc::UnboundedSender<Event>) -> Self {
        Self::with_period(events, Duration::from_secs(1))
    }

    pub fn with_period(events: mpsc::UnboundedSender<Event>, period: Duration) -> Self {
        Self {
            events,
            period,
            handle: None,
        }
    }
}

impl TickScheduler for IntervalScheduler {
    fn schedule(&mut self, generation: u64, ticks: u32) {
        self.cancel();

        let events = self.events.clone();
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for _ in 0..ticks {
                interval.tick().await;
                if events.send(Event::Tick { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Lifecycle of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
}

/// Result of feeding a tick into the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick belongs to a superseded countdown or arrived while not running.
    Stale,
    /// Countdown advanced; seconds left.
    Remaining(u32),
    /// Countdown reached zero.
    Expired,
}

pub struct QuestionTimer<S> {
    scheduler: S,
    generation: u64,
    remaining: u32,
    state: TimerState,
}

impl<S: TickScheduler> QuestionTimer<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            generation: 0,
            remaining: 0,
            state: TimerState::Idle,
        }
    }

    /// Cancel any running countdown and start a new one. Returns the initial value.
    pub fn start(&mut self) -> u32 {
        self.scheduler.cancel();
        self.generation += 1;
        self.remaining = QUESTION_DURATION_SECS;
        self.state = TimerState::Running;
        self.scheduler.schedule(self.generation, QUESTION_DURATION_SECS);
        self.remaining
    }

    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if self.state != TimerState::Running || generation != self.generation {
            return TickOutcome::Stale;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = TimerState::Expired;
            self.scheduler.cancel();
            TickOutcome::Expired
        } else {
            TickOutcome::Remaining(self.remaining)
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        scheduled: Vec<u64>,
        cancels: usize,
    }

    impl TickScheduler for Recorder {
        fn schedule(&mut self, generation: u64, _ticks: u32) {
            self.scheduled.push(generation);
        }

        fn cancel(&mut self) {
            self.cancels += 1;
        }
    }

    #[test]
    fn test_countdown_runs_to_expiry() {
        let mut timer = QuestionTimer::new(Recorder::default());
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.start(), 60);

        let generation = timer.generation();
        for expected in (1..60).rev() {
            assert_eq!(timer.tick(generation), TickOutcome::Remaining(expected));
        }
        assert_eq!(timer.tick(generation), TickOutcome::Expired);
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.tick(generation), TickOutcome::Stale);
    }

    #[test]
    fn test_restart_invalidates_old_generation() {
        let mut timer = QuestionTimer::new(Recorder::default());
        timer.start();
        let old = timer.generation();
        timer.tick(old);

        timer.start();
        assert_eq!(timer.tick(old), TickOutcome::Stale);
        assert_eq!(timer.remaining(), 60);
        assert_eq!(timer.tick(timer.generation()), TickOutcome::Remaining(59));

        // Cancellation always precedes the next schedule.
        assert_eq!(timer.scheduler().scheduled, vec![1, 2]);
        assert_eq!(timer.scheduler().cancels, 2);
    }

    #[test]
    fn test_tick_while_idle_is_stale() {
        let mut timer = QuestionTimer::new(Recorder::default());
        assert_eq!(timer.tick(0), TickOutcome::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_scheduler_delivers_and_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = IntervalScheduler::new(tx);

        scheduler.schedule(1, 3);
        for _ in 0..3 {
            assert!(matches!(rx.recv().await, Some(Event::Tick { generation: 1 })));
        }

        scheduler.schedule(2, 5);
        assert!(matches!(rx.recv().await, Some(Event::Tick { generation: 2 })));
        scheduler.cancel();

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
