// Device endpoints
//
// Inventory, grouped settings, and on-demand capture requests.

use serde_json::Value;
use tracing::debug;

use crate::client::{ApiClient, decode, field_or};
use crate::error::Error;
use crate::models::{
    CaptureKind, DeviceId, DeviceRecord, OnDemandRequest, SaveSettingsRequest, SettingsGroup,
};

impl ApiClient {
    /// List every camera on the account, in API order.
    ///
    /// `GET /api/v1/Device/Devices`
    pub async fn get_devices(&self) -> Result<Vec<DeviceRecord>, Error> {
        debug!("listing devices");
        let result = self.get("api/v1/Device/Devices", &[]).await?;
        field_or(&result, "Devices", Vec::new())
    }

    /// `GET /api/v1/Device/GetSingleDevice?cameraId={id}`
    pub async fn get_device(&self, camera_id: DeviceId) -> Result<DeviceRecord, Error> {
        debug!(%camera_id, "fetching device");
        let result = self
            .get(
                "api/v1/Device/GetSingleDevice",
                &[("cameraId", camera_id.to_string())],
            )
            .await?;
        decode(result)
    }

    /// Full grouped settings structure for one camera.
    ///
    /// `GET /api/v1/Device/GetGroupedSettings?id={id}`
    pub async fn get_device_settings(
        &self,
        camera_id: DeviceId,
    ) -> Result<Vec<SettingsGroup>, Error> {
        debug!(%camera_id, "fetching settings");
        let result = self
            .get(
                "api/v1/Device/GetGroupedSettings",
                &[("id", camera_id.to_string())],
            )
            .await?;
        field_or(&result, "GroupedSettings", Vec::new())
    }

    /// Write back the whole grouped settings structure.
    ///
    /// Returns the `SettingsSaved` flag (absent means `false`).
    ///
    /// `POST /api/v1/Device/SaveDeviceSettings`
    pub async fn save_device_settings(
        &self,
        camera_id: DeviceId,
        modem_id: Option<i64>,
        groups: &[SettingsGroup],
    ) -> Result<bool, Error> {
        debug!(%camera_id, ?modem_id, groups = groups.len(), "saving settings");
        let result = self
            .post(
                "api/v1/Device/SaveDeviceSettings",
                &SaveSettingsRequest {
                    camera_id,
                    modem_id,
                    settings: groups,
                },
            )
            .await?;
        field_or(&result, "SettingsSaved", false)
    }

    /// Ask the camera to take a photo or video at its next check-in.
    ///
    /// `POST /api/v1/Device/OnDemand`
    pub async fn request_on_demand(&self, meid: &str, kind: CaptureKind) -> Result<Value, Error> {
        debug!(meid, %kind, "requesting on-demand capture");
        self.post(
            "api/v1/Device/OnDemand",
            &OnDemandRequest {
                meid,
                did_consent: true,
                on_demand_event_type: kind.to_string(),
            },
        )
        .await
    }
}
