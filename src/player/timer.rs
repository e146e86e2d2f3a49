use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::core::TimerKind;

/// Delivered to the controller when an armed slot expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub generation: u64,
}

/// A single-shot timer slot. Arming replaces whatever was armed before;
/// a firing that raced with a re-arm is recognised by its generation.
pub struct TimerSlot {
    kind: TimerKind,
    generation: u64,
    token: Option<CancellationToken>,
}

impl TimerSlot {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            generation: 0,
            token: None,
        }
    }

    pub fn arm<M>(&mut self, delay: Duration, sender: &mpsc::UnboundedSender<M>)
    where
        M: From<TimerFired> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;

        let deadline = Instant::now() + delay;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let fired = TimerFired {
            kind: self.kind,
            generation: self.generation,
        };
        let sender = sender.clone();

        trace!("Arming {:?} timer #{} for {:?}", self.kind, self.generation, delay);
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = sleep_until(deadline) => {
                    let _ = sender.send(M::from(fired));
                }
            }
        });

        self.token = Some(token);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            trace!("Cancelling {:?} timer #{}", self.kind, self.generation);
            token.cancel();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.token.is_some()
    }

    /// Consume a firing; false when it belongs to an older arming.
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        if fired.kind == self.kind && fired.generation == self.generation && self.token.is_some() {
            self.token = None;
            true
        } else {
            trace!("Dropping stale {:?} timer #{}", fired.kind, fired.generation);
            false
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
