//! Stand-in recovery backend for driving the restoration flow locally.

use std::time::Duration;

use async_trait::async_trait;
use client_core::AccountRecovery;
use clap::ValueEnum;
use shared::{
    domain::{DisplayName, RecoveryPhrase},
    error::RecoveryError,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupOutcome {
    Found,
    NotFound,
    Error,
}

pub struct SimulatedRecovery {
    outcome: LookupOutcome,
    recovered_name: DisplayName,
    latency: Duration,
}

impl SimulatedRecovery {
    pub fn new(outcome: LookupOutcome, recovered_name: DisplayName, latency: Duration) -> Self {
        Self {
            outcome,
            recovered_name,
            latency,
        }
    }
}

#[async_trait]
impl AccountRecovery for SimulatedRecovery {
    async fn recover_display_name(
        &self,
        phrase: &RecoveryPhrase,
    ) -> Result<DisplayName, RecoveryError> {
        info!(
            words = phrase.word_count(),
            latency_ms = self.latency.as_millis() as u64,
            "simulated lookup started"
        );
        tokio::time::sleep(self.latency).await;
        match self.outcome {
            LookupOutcome::Found => Ok(self.recovered_name.clone()),
            LookupOutcome::NotFound => Err(RecoveryError::NotFound),
            LookupOutcome::Error => Err(RecoveryError::network("simulated network failure")),
        }
    }

    async fn sign_in_with_display_name(
        &self,
        _phrase: &RecoveryPhrase,
        display_name: &DisplayName,
    ) -> Result<(), RecoveryError> {
        tokio::time::sleep(self.latency / 2).await;
        info!(%display_name, "simulated sign-in stored display name");
        Ok(())
    }
}
