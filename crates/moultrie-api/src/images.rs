// Image endpoints
//
// Search results arrive nested as `{"Results": {"Results": [...]}}`.
// Image bytes come from the CDN without the bearer token.

use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use crate::client::{ApiClient, decode};
use crate::error::{Error, preview};
use crate::models::{DeviceId, ImageQuery, ImageRecord};

impl ApiClient {
    /// `POST /api/v2/Image/ImageSearch`
    pub async fn get_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>, Error> {
        debug!(?query, "searching images");
        let result = self.post("api/v2/Image/ImageSearch", query).await?;
        match result.get("Results").and_then(|r| r.get("Results")) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(results) => decode(results.clone()),
        }
    }

    /// Newest image for a camera, or `None` when it has none.
    pub async fn get_latest_image(
        &self,
        camera_id: DeviceId,
    ) -> Result<Option<ImageRecord>, Error> {
        let mut images = self.get_images(&ImageQuery::latest(camera_id)).await?;
        Ok((!images.is_empty()).then(|| images.swap_remove(0)))
    }

    /// `GET /api/v1/Image/GetPendingVideoAndHighResIds?deviceId={id}`
    pub async fn get_pending_requests(&self, camera_id: DeviceId) -> Result<Value, Error> {
        debug!(%camera_id, "fetching pending requests");
        self.get(
            "api/v1/Image/GetPendingVideoAndHighResIds",
            &[("deviceId", camera_id.to_string())],
        )
        .await
    }

    /// Download image bytes from the CDN.
    pub async fn fetch_image(&self, url: &str) -> Result<Bytes, Error> {
        debug!("GET {}", url);
        let timeout = self.transport().image_timeout;
        let resp = self
            .http()
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Error::from_send(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }
        Ok(resp.bytes().await?)
    }
}
