use serde::{Deserialize, Serialize};

use crate::{
    domain::{DisplayName, RestorationId, RestorationPhase},
    error::ApiError,
};

/// What a view needs to render the restoration screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub id: RestorationId,
    pub phase: RestorationPhase,
    pub percent: u8,
    pub recovered_display_name: Option<DisplayName>,
}

impl ProgressSnapshot {
    pub fn shows_progress_bar(&self) -> bool {
        self.phase.shows_progress_bar()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureContext {
    Input,
    Lookup,
    SignIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RestorationEvent {
    PhaseChanged {
        from: RestorationPhase,
        to: RestorationPhase,
    },
    LookupSucceeded {
        display_name: DisplayName,
    },
    Failed {
        context: FailureContext,
        error: ApiError,
    },
    OpenMainView {
        display_name: DisplayName,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecoveryError;

    #[test]
    fn events_are_tagged_for_views() {
        let event = RestorationEvent::PhaseChanged {
            from: RestorationPhase::Loading,
            to: RestorationPhase::DisplayName,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "phase_changed");
        assert_eq!(json["payload"]["from"], "loading");
        assert_eq!(json["payload"]["to"], "display_name");
    }

    #[test]
    fn failure_event_carries_error_code() {
        let event = RestorationEvent::Failed {
            context: FailureContext::Lookup,
            error: RecoveryError::NotFound.into(),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let back: RestorationEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
        assert!(json.contains("\"not_found\""));
    }
}
