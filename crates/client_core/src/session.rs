//! Async driver for one mounted restoration screen.

use std::sync::Arc;

use shared::{
    domain::{DisplayName, RecoveryPhrase, RestorationId, RestorationPhase},
    error::{ErrorCode, RecoveryError},
    protocol::{FailureContext, ProgressSnapshot, RestorationEvent},
};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::{JoinError, JoinHandle},
};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{
    controller::{RestorationController, Schedule, Step},
    settings::RestorationSettings,
    timer::{Fired, PhaseTimer},
    AccountRecovery,
};

const COMMAND_QUEUE_CAPACITY: usize = 16;
const EVENT_CAPACITY: usize = 64;

enum Command {
    SubmitRecoveryPhrase(RecoveryPhrase),
    SubmitDisplayName(DisplayName),
    Shutdown,
}

#[derive(Debug)]
enum Request {
    Lookup,
    SignIn(DisplayName),
}

/// A recovery call running beside the session loop. Aborted on drop.
struct InFlight {
    request: Request,
    task: JoinHandle<Result<DisplayName, RecoveryError>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn settle(
    in_flight: &mut Option<InFlight>,
) -> Result<Result<DisplayName, RecoveryError>, JoinError> {
    match in_flight.as_mut() {
        Some(call) => (&mut call.task).await,
        None => std::future::pending().await,
    }
}

pub struct RestorationSession {
    id: RestorationId,
    controller: RestorationController,
    timer: PhaseTimer,
    in_flight: Option<InFlight>,
    recovery: Arc<dyn AccountRecovery>,
    phrase: Option<RecoveryPhrase>,
    commands: mpsc::Receiver<Command>,
    state: watch::Sender<ProgressSnapshot>,
    events: broadcast::Sender<RestorationEvent>,
}

impl RestorationSession {
    /// Mounts a restoration screen: starts the session task in the
    /// `RecoveryPassword` phase and returns the handle views talk to.
    pub fn spawn(
        settings: RestorationSettings,
        recovery: Arc<dyn AccountRecovery>,
    ) -> RestorationHandle {
        let id = RestorationId::new();
        let controller = RestorationController::new(settings);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (state_tx, state_rx) = watch::channel(controller.state().snapshot(id));
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let session = Self {
            id,
            controller,
            timer: PhaseTimer::new(),
            in_flight: None,
            recovery,
            phrase: None,
            commands: command_rx,
            state: state_tx,
            events: events_tx.clone(),
        };
        let task = tokio::spawn(session.run().instrument(info_span!("restoration", %id)));

        RestorationHandle {
            id,
            commands: command_tx,
            state: state_rx,
            events: events_tx,
            task: Some(task),
        }
    }

    async fn run(mut self) {
        info!(
            recovery_timeout_ms = self.controller.settings().recovery_timeout_ms,
            "restoration screen mounted"
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                fired = self.timer.fired() => self.handle_timer(fired),
                joined = settle(&mut self.in_flight) => self.handle_settled(joined),
            }
        }

        self.timer.cancel();
        if self.in_flight.take().is_some() {
            debug!("aborted in-flight recovery call on unmount");
        }
        info!(phase = %self.controller.state().phase(), "restoration screen unmounted");
    }

    fn handle_command(&mut self, command: Command) {
        let phase = self.controller.state().phase();
        match command {
            Command::SubmitRecoveryPhrase(phrase) => {
                if phase != RestorationPhase::RecoveryPassword {
                    self.reject(format!("cannot submit a recovery phrase during {phase}"));
                    return;
                }

                info!(words = phrase.word_count(), "recovery phrase submitted");
                self.phrase = Some(phrase.clone());
                self.advance(Step::Enter(RestorationPhase::Loading));

                let recovery = Arc::clone(&self.recovery);
                let task = tokio::spawn(
                    async move { recovery.recover_display_name(&phrase).await }
                        .in_current_span(),
                );
                self.in_flight = Some(InFlight {
                    request: Request::Lookup,
                    task,
                });
            }
            Command::SubmitDisplayName(name) => {
                if phase != RestorationPhase::DisplayName {
                    self.reject(format!("cannot submit a display name during {phase}"));
                    return;
                }
                if self.in_flight.is_some() {
                    self.reject("sign-in is already in progress".to_string());
                    return;
                }
                let Some(phrase) = self.phrase.clone() else {
                    self.reject("no recovery phrase to sign in with".to_string());
                    return;
                };

                info!(display_name = %name, "signing in with manual display name");
                let recovery = Arc::clone(&self.recovery);
                let request = Request::SignIn(name.clone());
                let task = tokio::spawn(
                    async move {
                        recovery
                            .sign_in_with_display_name(&phrase, &name)
                            .await
                            .map(|()| name)
                    }
                    .in_current_span(),
                );
                self.in_flight = Some(InFlight { request, task });
            }
            Command::Shutdown => {}
        }
    }

    fn handle_timer(&mut self, fired: Fired) {
        let step = match fired {
            Fired::Tick => {
                let full = self.controller.on_tick();
                self.publish();
                if full {
                    self.controller.on_phase_complete()
                } else {
                    Step::Stay
                }
            }
            Fired::Delay => self.controller.on_phase_complete(),
        };
        self.advance(step);
    }

    fn handle_settled(
        &mut self,
        joined: Result<Result<DisplayName, RecoveryError>, JoinError>,
    ) {
        let Some(call) = self.in_flight.take() else {
            return;
        };
        let outcome = joined.unwrap_or_else(|err| {
            Err(RecoveryError::other(
                ErrorCode::Internal,
                format!("recovery task failed: {err}"),
            ))
        });

        match &call.request {
            Request::Lookup => self.handle_lookup(outcome),
            Request::SignIn(name) => {
                debug!(display_name = %name, "sign-in settled");
                self.handle_sign_in(outcome);
            }
        }
    }

    fn handle_lookup(&mut self, outcome: Result<DisplayName, RecoveryError>) {
        match &outcome {
            Ok(name) => {
                info!(display_name = %name, "display name recovered");
                self.emit(RestorationEvent::LookupSucceeded {
                    display_name: name.clone(),
                });
            }
            Err(err) => {
                warn!(error = %err, "display name lookup failed");
                self.emit(RestorationEvent::Failed {
                    context: FailureContext::Lookup,
                    error: err.clone().into(),
                });
            }
        }

        let next = self.controller.apply_lookup(outcome);
        self.publish();
        if let Some(phase) = next {
            self.advance(Step::Enter(phase));
        }
    }

    fn handle_sign_in(&mut self, outcome: Result<DisplayName, RecoveryError>) {
        match outcome {
            Ok(name) => {
                self.controller.accept_display_name(name);
                self.advance(Step::Enter(RestorationPhase::Complete));
            }
            Err(err) => {
                warn!(error = %err, "sign-in with display name failed");
                self.emit(RestorationEvent::Failed {
                    context: FailureContext::SignIn,
                    error: err.into(),
                });
            }
        }
    }

    fn advance(&mut self, mut step: Step) {
        loop {
            step = match step {
                Step::Stay => return,
                Step::Enter(phase) => self.enter(phase),
                Step::OpenMainView => {
                    if let Some(name) = self.controller.state().recovered_display_name().cloned()
                    {
                        info!(display_name = %name, "opening main view");
                        self.emit(RestorationEvent::OpenMainView { display_name: name });
                    }
                    return;
                }
            };
        }
    }

    fn enter(&mut self, phase: RestorationPhase) -> Step {
        let from = self.controller.state().phase();
        let schedule = self.controller.enter_phase(phase);
        self.timer.arm(schedule);

        if !phase.awaits_lookup()
            && matches!(
                self.in_flight.as_ref().map(|call| &call.request),
                Some(Request::Lookup)
            )
        {
            debug!(%phase, "dropping display name lookup that is no longer awaited");
            self.in_flight = None;
        }
        if phase == RestorationPhase::RecoveryPassword {
            self.phrase = None;
        }

        info!(%from, to = %phase, "restoration phase changed");
        self.emit(RestorationEvent::PhaseChanged { from, to: phase });
        self.publish();

        if schedule == Schedule::Immediate {
            self.controller.on_phase_complete()
        } else {
            Step::Stay
        }
    }

    fn reject(&mut self, message: String) {
        warn!(%message, "rejected restoration command");
        self.emit(RestorationEvent::Failed {
            context: FailureContext::Input,
            error: RecoveryError::Validation(message).into(),
        });
    }

    fn publish(&self) {
        self.state
            .send_replace(self.controller.state().snapshot(self.id));
    }

    fn emit(&self, event: RestorationEvent) {
        let _ = self.events.send(event);
    }
}

/// Handle to a running restoration session. Dropping it unmounts the screen.
pub struct RestorationHandle {
    id: RestorationId,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ProgressSnapshot>,
    events: broadcast::Sender<RestorationEvent>,
    task: Option<JoinHandle<()>>,
}

impl RestorationHandle {
    pub fn id(&self) -> RestorationId {
        self.id
    }

    pub fn state(&self) -> ProgressSnapshot {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ProgressSnapshot> {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RestorationEvent> {
        self.events.subscribe()
    }

    pub async fn submit_recovery_phrase(
        &self,
        raw: impl Into<String>,
    ) -> Result<(), RecoveryError> {
        let phrase = RecoveryPhrase::parse(raw)?;
        self.send(Command::SubmitRecoveryPhrase(phrase)).await
    }

    pub async fn submit_display_name(&self, raw: &str) -> Result<(), RecoveryError> {
        let name = DisplayName::sanitize(raw)?;
        self.send(Command::SubmitDisplayName(name)).await
    }

    /// Unmounts the screen and waits until the session task has released its
    /// timer and any in-flight recovery call.
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown).await;
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(id = %self.id, error = %err, "restoration task ended abnormally");
                }
            }
        }
    }

    async fn send(&self, command: Command) -> Result<(), RecoveryError> {
        self.commands.send(command).await.map_err(|_| {
            RecoveryError::other(ErrorCode::Internal, "restoration session has stopped")
        })
    }
}

impl Drop for RestorationHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
