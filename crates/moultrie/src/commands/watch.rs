//! `moultrie watch`: run the background poller until Ctrl-C, reporting
//! device changes and saving rotated tokens as they arrive.

use tokio::sync::broadcast::error::RecvError;

use moultrie_core::{Coordinator, DeviceEvent, Snapshot, UpdateStatus};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator,
    ctx: &Context,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let period = coordinator.config().refresh_interval;
    if period.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "watch needs a poll period above zero".into(),
        });
    }

    let mut events = coordinator.events();
    let mut tokens = coordinator.token_updates();

    let snapshot = coordinator.refresh().await?;
    let mut status = coordinator.status();
    report(global, &summary(&snapshot));
    coordinator.start().await;
    tracing::info!(period_secs = period.as_secs(), "watching for changes");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }

            event = events.recv() => match event {
                Ok(event) => report_event(global, &event)?,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "device events dropped");
                }
                Err(RecvError::Closed) => break,
            },

            Ok(()) = tokens.changed() => {
                let pair = tokens.borrow_and_update().clone();
                ctx.save_tokens_if_changed(&pair)?;
            }

            Ok(()) = status.changed() => {
                let current = status.borrow_and_update().clone();
                match current {
                    UpdateStatus::Updated { .. } => {
                        report(global, &summary(&coordinator.snapshot()));
                    }
                    UpdateStatus::Failed { message } => {
                        tracing::warn!(%message, "refresh failed; keeping last snapshot");
                    }
                    UpdateStatus::ReauthRequired { message } => {
                        return Err(CliError::AuthFailed { message });
                    }
                    UpdateStatus::Idle => {}
                }
            }
        }
    }
    Ok(())
}

fn summary(snapshot: &Snapshot) -> String {
    let at = snapshot
        .fetched_at()
        .map(|t| t.format("%H:%M:%S").to_string());
    output::dim(format!(
        "[{}] {} device(s)",
        output::or_dash(at),
        snapshot.len()
    ))
}

fn report(global: &GlobalOpts, line: &str) {
    if matches!(global.output, OutputFormat::Table | OutputFormat::Plain) {
        output::print_output(line, global.quiet);
    }
}

fn report_event(global: &GlobalOpts, event: &DeviceEvent) -> Result<(), CliError> {
    let line = match global.output {
        OutputFormat::Table | OutputFormat::Plain => match event {
            DeviceEvent::Added(ids) => {
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                format!("{} added: {}", output::good("+"), ids.join(", "))
            }
            DeviceEvent::Removed(id) => format!("{} removed: {id}", output::bad("-")),
        },
        OutputFormat::Yaml => serde_yaml::to_string(event).map_err(|e| CliError::Validation {
            field: "output".into(),
            reason: e.to_string(),
        })?,
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(event)?,
    };
    output::print_output(&line, global.quiet);
    Ok(())
}
