//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod auth;
pub mod capture;
pub mod devices;
pub mod notifications;
pub mod settings;
pub mod watch;

use std::time::Duration;

use moultrie_core::{Coordinator, SessionConfig};

use crate::cli::{Command, GlobalOpts, WatchArgs};
use crate::config::Context;
use crate::error::CliError;

/// Sign in, run a session-bound command, then write back any rotated
/// tokens and stop the coordinator.
pub async fn dispatch(
    cmd: Command,
    session: SessionConfig,
    ctx: &Context,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut session = session;
    if let Command::Watch(WatchArgs {
        interval: Some(secs),
    }) = &cmd
    {
        session.refresh_interval = Duration::from_secs(*secs);
    }

    let coordinator = Coordinator::sign_in(session).await?;

    let result = match cmd {
        Command::Devices(args) => devices::handle(&coordinator, args, global).await,
        Command::Settings(args) => settings::handle(&coordinator, args, global).await,
        Command::Capture(args) => capture::handle(&coordinator, args, global).await,
        Command::Notifications => notifications::handle(&coordinator, global).await,
        Command::Watch(_) => watch::handle(&coordinator, ctx, global).await,
        // Auth and Completions are handled before dispatch
        Command::Auth(_) | Command::Completions(_) => unreachable!(),
    };

    let saved = ctx.save_tokens_if_changed(&coordinator.tokens());
    coordinator.shutdown().await;

    result?;
    saved.map(|_| ())
}
