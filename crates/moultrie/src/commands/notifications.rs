//! Unread notification check.

use serde_json::json;

use moultrie_core::Coordinator;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let unread = coordinator.has_unread_notifications().await;

    let out = output::render_single(
        &global.output,
        &json!({ "has_unread": unread }),
        |_| {
            if unread {
                "You have unread notifications".into()
            } else {
                output::dim("No unread notifications")
            }
        },
        |_| unread.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
