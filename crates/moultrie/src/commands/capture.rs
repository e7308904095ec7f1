//! On-demand capture handler.

use moultrie_core::{CaptureKind, Coordinator, DeviceId};

use crate::cli::{CaptureArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator,
    args: CaptureArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id = DeviceId(args.device);
    let kind = if args.video {
        CaptureKind::Video
    } else {
        CaptureKind::Image
    };

    coordinator.refresh().await?;
    let ack = coordinator.capture(id, kind).await?;

    let out = output::render_single(
        &global.output,
        &ack,
        |_| format!("{} {kind} requested from device {id}", output::good("✓")),
        |_| id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
