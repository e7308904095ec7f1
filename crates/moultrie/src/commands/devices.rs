//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use moultrie_core::{Coordinator, DeviceEntry, DeviceId};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, or_dash, yes_no};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Storage")]
    storage: String,
    #[tabled(rename = "Last Image")]
    last_image: String,
}

impl From<&Arc<DeviceEntry>> for DeviceRow {
    fn from(entry: &Arc<DeviceEntry>) -> Self {
        let d = &entry.device;
        Self {
            id: d.id.to_string(),
            name: d.label(),
            model: or_dash(d.display_model()),
            battery: or_dash(d.battery_percent.map(|v| format!("{v}%"))),
            signal: or_dash(d.signal_percent.map(|v| format!("{v}%"))),
            storage: storage(entry),
            last_image: or_dash(
                entry
                    .latest_image
                    .as_ref()
                    .and_then(|i| i.taken_on)
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
            ),
        }
    }
}

fn storage(entry: &DeviceEntry) -> String {
    match (
        entry.device.free_storage_gb(),
        entry.device.total_storage_gb(),
    ) {
        (Some(free), Some(total)) => format!("{free:.2}/{total:.2} GB free"),
        (Some(free), None) => format!("{free:.2} GB free"),
        _ => "-".into(),
    }
}

fn detail(entry: &Arc<DeviceEntry>) -> String {
    let d = &entry.device;
    let support = d.capture_support();
    let mut lines = vec![
        format!("ID:           {}", d.id),
        format!("Name:         {}", d.label()),
        format!("Model:        {}", or_dash(d.display_model())),
        format!("Serial:       {}", or_dash(d.serial.as_deref())),
        format!("Firmware:     {}", or_dash(d.firmware.as_deref())),
        format!("Battery:      {}", or_dash(d.battery_percent.map(|v| format!("{v}%")))),
        format!("Signal:       {}", or_dash(d.signal_percent.map(|v| format!("{v}%")))),
        format!("Storage:      {}", storage(entry)),
        format!("Active:       {}", yes_no(d.is_active)),
        format!("Last Active:  {}", or_dash(d.last_activity.map(|t| t.to_rfc3339()))),
        format!("Pending Sync: {}", yes_no(d.pending_settings_update)),
        format!(
            "On Demand:    photo {}, video {}",
            yes_no(Some(support.image)),
            yes_no(Some(support.video))
        ),
    ];

    if let Some(sub) = &d.subscription {
        lines.push(format!("Plan:         {}", or_dash(sub.plan_name.as_deref())));
        lines.push(format!("Images Used:  {}", or_dash(sub.images_used)));
        if sub.pending_cancellation {
            lines.push(format!("              {}", output::bad("cancellation pending")));
        }
    }

    if let Some(image) = &entry.latest_image {
        lines.push(format!(
            "Last Image:   {}",
            or_dash(image.taken_on.map(|t| t.to_rfc3339()))
        ));
        if let Some(temp) = image.temperature_f {
            lines.push(format!("Temperature:  {temp:.0}°F"));
        }
        lines.push(format!(
            "Image URL:    {}",
            or_dash(image.url.as_deref().or(image.enhanced_url.as_deref()))
        ));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = coordinator.refresh().await?;

    match args.command {
        DevicesCommand::List => {
            let entries: Vec<_> = snapshot.iter().cloned().collect();
            let out = output::render_list(
                &global.output,
                &entries,
                |e| DeviceRow::from(e),
                |e| e.id().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let id = DeviceId(device);
            let entry = snapshot
                .get(id)
                .ok_or_else(|| CliError::device_not_found(id))?;
            let out = output::render_single(&global.output, entry, detail, |e| e.id().to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
