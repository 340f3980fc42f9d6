use std::{future, pin::Pin};

use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};

use crate::controller::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Tick,
    Delay,
}

enum Armed {
    Ticker(Interval),
    Delay(Pin<Box<Sleep>>),
}

/// The one timer slot of a restoration session.
///
/// Arming replaces whatever was armed before, so at most one tick source is
/// alive at any time. Dropping the timer disarms it.
#[derive(Default)]
pub struct PhaseTimer {
    armed: Option<Armed>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, schedule: Schedule) {
        self.cancel();
        self.armed = match schedule {
            Schedule::Ticker(period) => {
                let mut interval = time::interval_at(Instant::now() + period, period);
                // late ticks are caught up so the bar tracks its time budget
                interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
                Some(Armed::Ticker(interval))
            }
            Schedule::Delay(delay) => Some(Armed::Delay(Box::pin(time::sleep(delay)))),
            Schedule::Idle | Schedule::Immediate => None,
        };
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Resolves when the armed timer fires; never resolves while disarmed.
    /// A delay disarms itself once it has fired.
    ///
    /// Cancel safe: dropping the future keeps the timer armed.
    pub async fn fired(&mut self) -> Fired {
        match &mut self.armed {
            None => future::pending().await,
            Some(Armed::Ticker(interval)) => {
                interval.tick().await;
                Fired::Tick
            }
            Some(Armed::Delay(sleep)) => {
                sleep.as_mut().await;
                self.armed = None;
                Fired::Delay
            }
        }
    }
}
