use async_trait::async_trait;
use shared::{
    domain::{DisplayName, RecoveryPhrase},
    error::RecoveryError,
};

pub mod controller;
pub mod progress;
pub mod session;
pub mod settings;
pub mod timer;

pub use controller::{transition, RestorationController, Schedule, Step};
pub use progress::{ProgressState, FULL_PERCENT};
pub use session::{RestorationHandle, RestorationSession};
pub use settings::{load_settings, RestorationSettings};
pub use timer::{Fired, PhaseTimer};

/// Account recovery backend the restoration flow talks to.
#[async_trait]
pub trait AccountRecovery: Send + Sync {
    /// Restores the account behind `phrase` and fetches its display name.
    /// Fails with [`RecoveryError::NotFound`] when no display name is stored.
    async fn recover_display_name(
        &self,
        phrase: &RecoveryPhrase,
    ) -> Result<DisplayName, RecoveryError>;

    async fn sign_in_with_display_name(
        &self,
        phrase: &RecoveryPhrase,
        display_name: &DisplayName,
    ) -> Result<(), RecoveryError>;
}

pub struct MissingAccountRecovery;

#[async_trait]
impl AccountRecovery for MissingAccountRecovery {
    async fn recover_display_name(
        &self,
        _phrase: &RecoveryPhrase,
    ) -> Result<DisplayName, RecoveryError> {
        Err(RecoveryError::network("account recovery backend unavailable"))
    }

    async fn sign_in_with_display_name(
        &self,
        _phrase: &RecoveryPhrase,
        _display_name: &DisplayName,
    ) -> Result<(), RecoveryError> {
        Err(RecoveryError::network("account recovery backend unavailable"))
    }
}
