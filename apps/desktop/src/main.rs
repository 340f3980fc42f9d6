use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{load_settings, RestorationSession};
use shared::{
    domain::{DisplayName, RestorationPhase},
    protocol::{ProgressSnapshot, RestorationEvent},
};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod simulated;

use simulated::{LookupOutcome, SimulatedRecovery};

const BAR_WIDTH: usize = 40;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    recovery_phrase: String,
    /// Name to enter if the flow falls back to manual display-name entry.
    #[arg(long)]
    display_name: Option<String>,
    #[arg(long, value_enum, default_value_t = LookupOutcome::Found)]
    outcome: LookupOutcome,
    #[arg(long, default_value = "Alice")]
    recovered_name: String,
    #[arg(long, default_value_t = 1500)]
    lookup_delay_ms: u64,
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Print events as JSON lines instead of drawing a progress bar.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(args.settings.as_deref())?;
    let recovered_name =
        DisplayName::sanitize(&args.recovered_name).context("invalid --recovered-name")?;
    let recovery = SimulatedRecovery::new(
        args.outcome,
        recovered_name,
        Duration::from_millis(args.lookup_delay_ms),
    );

    let handle = RestorationSession::spawn(settings, Arc::new(recovery));
    let mut events = handle.subscribe();
    let mut state = handle.watch_state();

    handle
        .submit_recovery_phrase(args.recovery_phrase.as_str())
        .await
        .context("recovery phrase rejected")?;

    let outcome = loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break Err(anyhow!("restoration session stopped unexpectedly"));
                }
                let snapshot = state.borrow_and_update().clone();
                if !args.json {
                    draw(&snapshot)?;
                }
            }
            event = events.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed restoration events");
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        break Err(anyhow!("restoration event stream closed"));
                    }
                };
                if args.json {
                    println!("{}", serde_json::to_string(&event)?);
                }

                match event {
                    RestorationEvent::OpenMainView { display_name } => break Ok(display_name),
                    RestorationEvent::PhaseChanged { to: RestorationPhase::DisplayName, .. } => {
                        let Some(name) = args.display_name.as_deref() else {
                            break Err(anyhow!(
                                "no display name could be recovered; rerun with --display-name"
                            ));
                        };
                        if let Err(err) = handle.submit_display_name(name).await {
                            break Err(anyhow::Error::new(err).context("display name rejected"));
                        }
                    }
                    RestorationEvent::PhaseChanged { to: RestorationPhase::RecoveryPassword, .. } => {
                        break Err(anyhow!(
                            "recovery failed; check the recovery phrase and try again"
                        ));
                    }
                    RestorationEvent::Failed { context, error } => {
                        warn!(?context, code = ?error.code, message = %error.message, "restoration step failed");
                    }
                    _ => {}
                }
            }
        }
    };

    handle.shutdown().await;
    if !args.json {
        println!();
    }

    let display_name = outcome?;
    println!("Welcome back, {display_name}. Opening conversations.");
    Ok(())
}

fn draw(snapshot: &ProgressSnapshot) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if snapshot.shows_progress_bar() {
        write!(
            stdout,
            "\r{} {:>3}% {:<10}",
            render_bar(snapshot.percent, BAR_WIDTH),
            snapshot.percent,
            snapshot.phase.as_str()
        )?;
    } else {
        write!(stdout, "\r{:<60}", format!("[{}]", snapshot.phase.as_str()))?;
    }
    stdout.flush()?;
    Ok(())
}

fn render_bar(percent: u8, width: usize) -> String {
    let filled = usize::from(percent.min(100)) * width / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}
