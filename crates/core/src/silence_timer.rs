//! One-shot, restartable countdown.
//!
//! Arming spawns a task that sleeps and then queues [`Event::TimerFired`].
//! Re-arming aborts the previous task and restarts the full duration, so the
//! timer debounces rather than throttles. Every arm and disarm bumps a
//! generation counter; a fire that was already queued when the timer got
//! re-armed carries a stale generation and is rejected by [`SilenceTimer::accept`].

use crate::Event;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Ends a turn when the user stops talking.
    Silence,
    /// Delays the next listening attempt.
    ListenGap,
}

pub struct SilenceTimer {
    kind: TimerKind,
    events: UnboundedSender<Event>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl SilenceTimer {
    pub fn new(kind: TimerKind, events: UnboundedSender<Event>) -> Self {
        Self {
            kind,
            events,
            generation: 0,
            task: None,
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Starts or restarts the countdown.
    pub fn arm(&mut self, after: Duration) {
        self.abort_task();
        self.generation += 1;

        let kind = self.kind;
        let generation = self.generation;
        let events = self.events.clone();
        tracing::trace!("{:?} timer armed for {:?} (generation {})", kind, after, generation);

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if events
                .send(Event::TimerFired {
                    timer: kind,
                    generation,
                })
                .is_err()
            {
                tracing::debug!("{:?} timer fired after the event queue closed", kind);
            }
        }));
    }

    /// Cancels the countdown. Nothing fires for the current arm afterwards.
    pub fn disarm(&mut self) {
        self.abort_task();
        self.generation += 1;
    }

    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Returns true exactly once for the fire belonging to the current arm.
    pub fn accept(&mut self, generation: u64) -> bool {
        if generation == self.generation && self.task.is_some() {
            self.task = None;
            true
        } else {
            tracing::debug!(
                "dropping stale {:?} timer fire (generation {}, current {})",
                self.kind,
                generation,
                self.generation
            );
            false
        }
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SilenceTimer {
    fn drop(&mut self) {
        self.abort_task();
    }
}
