use shared::{
    domain::{DisplayName, RestorationId, RestorationPhase},
    protocol::ProgressSnapshot,
};

pub const FULL_PERCENT: u8 = 100;

/// Live state of one restoration screen. Only the controller mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    phase: RestorationPhase,
    percent: u8,
    recovered_display_name: Option<DisplayName>,
}

impl ProgressState {
    pub fn phase(&self) -> RestorationPhase {
        self.phase
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn recovered_display_name(&self) -> Option<&DisplayName> {
        self.recovered_display_name.as_ref()
    }

    pub fn has_display_name(&self) -> bool {
        self.recovered_display_name.is_some()
    }

    pub fn is_full(&self) -> bool {
        self.percent >= FULL_PERCENT
    }

    pub fn snapshot(&self, id: RestorationId) -> ProgressSnapshot {
        ProgressSnapshot {
            id,
            phase: self.phase,
            percent: self.percent,
            recovered_display_name: self.recovered_display_name.clone(),
        }
    }

    pub(crate) fn set_phase(&mut self, phase: RestorationPhase) {
        self.phase = phase;
    }

    pub(crate) fn reset_percent(&mut self) {
        self.percent = 0;
    }

    pub(crate) fn advance(&mut self) -> bool {
        if self.percent < FULL_PERCENT {
            self.percent += 1;
        }
        self.is_full()
    }

    pub(crate) fn record_display_name(&mut self, name: DisplayName) {
        self.recovered_display_name = Some(name);
    }
}
