use std::time::Duration;

use shared::{
    domain::{DisplayName, RestorationPhase},
    error::RecoveryError,
};
use tracing::debug;

use crate::{
    progress::{ProgressState, FULL_PERCENT},
    settings::{tick_period, RestorationSettings},
};

/// Timer a phase needs once it becomes active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Idle,
    /// Decide right away, without waiting on a timer.
    Immediate,
    Ticker(Duration),
    Delay(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stay,
    Enter(RestorationPhase),
    OpenMainView,
}

/// Decision table for a phase whose bar or delay has completed.
pub fn transition(phase: RestorationPhase, percent: u8, name_present: bool) -> Step {
    use RestorationPhase as Phase;

    let bar_full = percent >= FULL_PERCENT;
    match (phase, bar_full, name_present) {
        (Phase::Loading, true, _) => Step::Enter(Phase::Finishing),
        (Phase::Finishing, true, _) => Step::Enter(Phase::Finished),
        (Phase::Finished, _, true) => Step::Enter(Phase::Complete),
        (Phase::Finished, _, false) => Step::Enter(Phase::DisplayName),
        (Phase::Complete, _, true) => Step::OpenMainView,
        _ => Step::Stay,
    }
}

pub struct RestorationController {
    settings: RestorationSettings,
    state: ProgressState,
    main_view_opened: bool,
}

impl RestorationController {
    pub fn new(settings: RestorationSettings) -> Self {
        Self {
            settings,
            state: ProgressState::default(),
            main_view_opened: false,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn settings(&self) -> &RestorationSettings {
        &self.settings
    }

    pub fn enter_phase(&mut self, phase: RestorationPhase) -> Schedule {
        let restart_bar = phase == RestorationPhase::Loading
            || (phase.has_ticker() && self.state.is_full());
        if restart_bar {
            self.state.reset_percent();
        }
        self.state.set_phase(phase);

        let schedule = match phase {
            RestorationPhase::Loading => {
                Schedule::Ticker(tick_period(self.settings.recovery_timeout()))
            }
            RestorationPhase::Finishing => {
                Schedule::Ticker(tick_period(self.settings.finishing_duration()))
            }
            RestorationPhase::Finished if self.settings.finished_delay().is_zero() => {
                Schedule::Immediate
            }
            RestorationPhase::Finished => Schedule::Delay(self.settings.finished_delay()),
            RestorationPhase::Complete => Schedule::Immediate,
            RestorationPhase::RecoveryPassword | RestorationPhase::DisplayName => Schedule::Idle,
        };
        debug!(%phase, percent = self.state.percent(), ?schedule, "entered phase");
        schedule
    }

    /// Returns whether the bar is full after the tick.
    pub fn on_tick(&mut self) -> bool {
        if !self.state.phase().has_ticker() {
            return false;
        }
        let full = self.state.advance();
        debug!(phase = %self.state.phase(), percent = self.state.percent(), "tick");
        full
    }

    pub fn on_phase_complete(&mut self) -> Step {
        let step = transition(
            self.state.phase(),
            self.state.percent(),
            self.state.has_display_name(),
        );
        if step == Step::OpenMainView {
            if self.main_view_opened {
                return Step::Stay;
            }
            self.main_view_opened = true;
        }
        step
    }

    /// Applies the outcome of the display-name lookup and returns the phase
    /// to route to, if any.
    pub fn apply_lookup(
        &mut self,
        outcome: Result<DisplayName, RecoveryError>,
    ) -> Option<RestorationPhase> {
        let phase = self.state.phase();
        if !phase.awaits_lookup() {
            debug!(%phase, "ignoring lookup outcome outside the progress phases");
            return None;
        }

        match outcome {
            Ok(name) => {
                self.state.record_display_name(name);
                (self.settings.advance_on_lookup && phase == RestorationPhase::Loading)
                    .then_some(RestorationPhase::Finishing)
            }
            Err(RecoveryError::NotFound) => Some(RestorationPhase::DisplayName),
            Err(_) => Some(RestorationPhase::RecoveryPassword),
        }
    }

    pub fn accept_display_name(&mut self, name: DisplayName) {
        self.state.record_display_name(name);
    }

    pub fn main_view_opened(&self) -> bool {
        self.main_view_opened
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
