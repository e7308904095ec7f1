// Account and notification endpoints

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{ApiClient, field_or};
use crate::error::Error;

impl ApiClient {
    /// `GET /api/v1/Account/AccountDetails?Update=false`
    pub async fn get_account(&self) -> Result<Value, Error> {
        debug!("fetching account details");
        self.get(
            "api/v1/Account/AccountDetails",
            &[("Update", "false".to_owned())],
        )
        .await
    }

    /// Whether the notification center has unread items.
    ///
    /// Any failure reads as `false`.
    pub async fn has_unread_notifications(&self) -> bool {
        let result = self
            .get("api/v1/NotificationCenter/HasUnreadNotification", &[])
            .await
            .and_then(|v| field_or(&v, "HasUnreadNotification", false));
        match result {
            Ok(unread) => unread,
            Err(e) => {
                warn!(error = %e, "unread notification check failed");
                false
            }
        }
    }
}
