// ── Latest image ──

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Newest image of a camera.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Image {
    pub url: Option<String>,
    pub enhanced_url: Option<String>,
    pub taken_on: Option<DateTime<Utc>>,
    /// Degrees Fahrenheit reported by the camera.
    pub temperature_f: Option<f64>,
    pub on_demand: bool,
    pub flash: bool,
}
