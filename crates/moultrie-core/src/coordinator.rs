// ── Coordinator ──
//
// Per-account lifecycle: authentication, the periodic reconciliation
// cycle, snapshot publishing, device-change events and the two
// mutations (settings writes and on-demand captures).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, Notify, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use moultrie_api::{ApiClient, DeviceRecord, LoginFlow, TokenManager, TokenPair};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::model::settings::{self, toggle_value, value_for_option};
use crate::model::{CaptureKind, Device, DeviceEntry, DeviceId, Image, SettingRecord, Snapshot};
use crate::store::{DeviceChanges, SnapshotStore};
use crate::stream::SnapshotStream;

const EVENT_CHANNEL_SIZE: usize = 64;

// ── Observable state ─────────────────────────────────────────────

/// Outcome of the most recent refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UpdateStatus {
    /// No cycle has finished yet.
    Idle,
    Updated { at: DateTime<Utc> },
    /// The cycle failed; the previous snapshot is still served.
    Failed { message: String },
    /// Tokens and stored credentials were rejected.
    ReauthRequired { message: String },
}

impl UpdateStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Device-set change detected between two cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "devices", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// New devices, in API order. Never emitted by the first cycle.
    Added(Vec<DeviceId>),
    Removed(DeviceId),
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Owns the API client,
/// the published snapshot and the background refresh task.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: SessionConfig,
    client: ApiClient,
    store: SnapshotStore,
    status: watch::Sender<UpdateStatus>,
    events: broadcast::Sender<DeviceEvent>,
    /// Held for a whole cycle; guards the ids of the last published cycle.
    cycle: Mutex<BTreeSet<DeviceId>>,
    trigger: Notify,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Wrap an existing client. Does NOT fetch anything -- call
    /// [`refresh()`](Self::refresh) or [`start()`](Self::start).
    pub fn new(client: ApiClient, config: SessionConfig) -> Self {
        let (status, _) = watch::channel(UpdateStatus::Idle);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                store: SnapshotStore::new(),
                status,
                events,
                cycle: Mutex::new(BTreeSet::new()),
                trigger: Notify::new(),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Build the API client from `config`, signing in with the stored
    /// credentials when no tokens were supplied. No data is fetched.
    pub async fn sign_in(config: SessionConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let login = LoginFlow::new(config.endpoints.clone(), transport.clone());

        let tokens = match (config.tokens.clone(), config.credentials.clone()) {
            (Some(pair), credentials) if !pair.is_empty() => {
                TokenManager::new(login, pair, credentials)
            }
            (_, Some(credentials)) => {
                info!(email = %credentials.email, "signing in");
                TokenManager::sign_in(login, credentials).await?
            }
            (_, None) => return Err(CoreError::CredentialsRequired),
        };

        let client = ApiClient::new(config.endpoints.clone(), transport, Arc::new(tokens))?;
        Ok(Self::new(client, config))
    }

    /// Sign in, run the first cycle and start the background task.
    pub async fn connect(config: SessionConfig) -> Result<Self, CoreError> {
        let coordinator = Self::sign_in(config).await?;
        coordinator.refresh().await?;
        coordinator.start().await;
        info!(
            devices = coordinator.inner.store.device_count(),
            "connected to Moultrie"
        );
        Ok(coordinator)
    }

    /// Sign in, run one cycle, run the closure, shut down. The
    /// background task is never started.
    pub async fn oneshot<F, Fut, T>(config: SessionConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Coordinator) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = Duration::ZERO;

        let coordinator = Self::sign_in(cfg).await?;
        coordinator.refresh().await?;
        let result = f(coordinator.clone()).await;
        coordinator.shutdown().await;
        result
    }

    /// Spawn the background refresh task. It polls every
    /// `refresh_interval` (never when zero) and on
    /// [`request_refresh()`](Self::request_refresh).
    pub async fn start(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() || self.inner.cancel.is_cancelled() {
            return;
        }
        let period = self.inner.config.refresh_interval;
        let cancel = self.inner.cancel.clone();
        handles.push(tokio::spawn(refresh_task(self.clone(), period, cancel)));
    }

    /// Cancel the background task and any cycle in flight, then wait for
    /// the task to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("coordinator stopped");
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    // ── Reconciliation ───────────────────────────────────────────

    /// Run one reconciliation cycle now.
    ///
    /// Cycles are serialized. On success the new snapshot is published
    /// and add/remove events are sent; on failure nothing is published
    /// and the previous snapshot stays readable.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let mut known = self.inner.cycle.lock().await;

        let fetched = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(CoreError::Cancelled),
            result = self.fetch_entries() => result,
        };

        let entries = match fetched {
            Ok(entries) => entries,
            Err(e) => {
                let e = e.into_cycle_failure();
                self.report_failure(&e);
                return Err(e);
            }
        };

        let ids: Vec<DeviceId> = entries.iter().map(DeviceEntry::id).collect();
        let changes = DeviceChanges::between(&known, &ids);
        let now = Utc::now();

        self.inner.store.publish(Snapshot::new(entries, now));
        *known = ids.into_iter().collect();
        self.emit(changes);
        self.inner
            .status
            .send_replace(UpdateStatus::Updated { at: now });

        debug!(devices = known.len(), "refresh cycle complete");
        Ok(self.inner.store.snapshot())
    }

    /// Ask the background task for a cycle. Requests made while a cycle
    /// is pending collapse into one.
    pub fn request_refresh(&self) {
        self.inner.trigger.notify_one();
    }

    async fn fetch_entries(&self) -> Result<Vec<DeviceEntry>, CoreError> {
        let client = &self.inner.client;

        let records = match client.get_devices().await {
            Ok(records) => records,
            Err(e @ moultrie_api::Error::Authentication { .. }) => {
                info!(error = %e, "device list rejected, signing in again");
                client.tokens().relogin().await?;
                client.get_devices().await?
            }
            Err(e) => return Err(e.into()),
        };

        try_join_all(records.into_iter().map(|record| self.fetch_entry(record))).await
    }

    async fn fetch_entry(&self, record: DeviceRecord) -> Result<DeviceEntry, CoreError> {
        let client = &self.inner.client;
        let id = record.device_id;

        let (image, groups) = tokio::try_join!(
            client.get_latest_image(id),
            client.get_device_settings(id),
        )?;

        Ok(DeviceEntry::new(
            Device::from(record),
            image.map(Image::from),
            groups,
        ))
    }

    fn emit(&self, changes: DeviceChanges) {
        if !changes.added.is_empty() {
            info!(devices = ?changes.added, "new devices discovered");
            let _ = self.inner.events.send(DeviceEvent::Added(changes.added));
        }
        for id in changes.removed {
            info!(device_id = %id, "device removed");
            let _ = self.inner.events.send(DeviceEvent::Removed(id));
        }
    }

    fn report_failure(&self, error: &CoreError) {
        let status = match error {
            CoreError::Cancelled => return,
            e if e.is_reauth_required() => UpdateStatus::ReauthRequired {
                message: e.to_string(),
            },
            e => UpdateStatus::Failed {
                message: e.to_string(),
            },
        };
        warn!(error = %error, "refresh cycle failed");
        self.inner.status.send_replace(status);
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Last published snapshot (empty before the first cycle).
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.snapshot()
    }

    pub fn device(&self, id: DeviceId) -> Option<Arc<DeviceEntry>> {
        self.inner.store.device(id)
    }

    /// Receiver for published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.store.subscribe()
    }

    pub fn stream(&self) -> SnapshotStream {
        self.inner.store.stream()
    }

    /// Device add/remove notifications.
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.inner.events.subscribe()
    }

    /// Outcome of the latest cycle.
    pub fn status(&self) -> watch::Receiver<UpdateStatus> {
        self.inner.status.subscribe()
    }

    /// Every token replacement, for persistence by the host.
    pub fn token_updates(&self) -> watch::Receiver<TokenPair> {
        self.inner.client.tokens().subscribe()
    }

    pub fn tokens(&self) -> TokenPair {
        self.inner.client.tokens().current()
    }

    // ── Settings ─────────────────────────────────────────────────

    /// Write a raw value for `short_code`.
    ///
    /// Reads the device's full settings groups, updates every copy of the
    /// setting and sends the whole structure back. A save the API does
    /// not confirm is an error.
    pub async fn apply_setting(
        &self,
        device_id: DeviceId,
        short_code: &str,
        value: &str,
    ) -> Result<(), CoreError> {
        self.write_setting(device_id, short_code, |_| value.to_owned())
            .await
    }

    /// Select an option by its display text. Unknown text is sent as-is.
    pub async fn apply_option(
        &self,
        device_id: DeviceId,
        short_code: &str,
        label: &str,
    ) -> Result<(), CoreError> {
        self.write_setting(device_id, short_code, |setting| {
            value_for_option(setting, label)
        })
        .await
    }

    /// Switch a `T`/`F` setting.
    pub async fn set_toggle(
        &self,
        device_id: DeviceId,
        short_code: &str,
        on: bool,
    ) -> Result<(), CoreError> {
        self.write_setting(device_id, short_code, |_| toggle_value(on).to_owned())
            .await
    }

    async fn write_setting<F>(
        &self,
        device_id: DeviceId,
        short_code: &str,
        choose: F,
    ) -> Result<(), CoreError>
    where
        F: FnOnce(&SettingRecord) -> String,
    {
        let client = &self.inner.client;
        let modem_id = self.modem_id(device_id).await?;

        let mut groups = client.get_device_settings(device_id).await?;
        let index = settings::flatten_settings(&groups);
        let Some(setting) = index.get(short_code) else {
            return Err(CoreError::SettingNotFound {
                device_id,
                short_code: short_code.to_owned(),
            });
        };
        let value = choose(setting);

        let updated = settings::apply_value(&mut groups, short_code, &value);
        debug!(%device_id, short_code, value = %value, copies = updated, "saving setting");

        if !client
            .save_device_settings(device_id, modem_id, &groups)
            .await?
        {
            return Err(CoreError::SettingsNotSaved { device_id });
        }

        info!(%device_id, short_code, value = %value, "setting saved");
        self.request_refresh();
        Ok(())
    }

    /// Modem id from the snapshot, falling back to a single-device
    /// lookup for devices not seen yet.
    async fn modem_id(&self, device_id: DeviceId) -> Result<Option<i64>, CoreError> {
        if let Some(entry) = self.device(device_id) {
            return Ok(entry.device.modem_id);
        }
        let record = self
            .inner
            .client
            .get_device(device_id)
            .await
            .map_err(|e| not_found_or(e, device_id))?;
        Ok(record.modem_id)
    }

    // ── On-demand capture ────────────────────────────────────────

    /// Ask the camera identified by `meid` for a new photo or video.
    /// Returns the API acknowledgement.
    pub async fn request_capture(
        &self,
        device_id: DeviceId,
        meid: &str,
        kind: CaptureKind,
    ) -> Result<Value, CoreError> {
        if meid.is_empty() {
            return Err(CoreError::CaptureUnavailable {
                device_id,
                reason: "device has no MEID".into(),
            });
        }

        let ack = self.inner.client.request_on_demand(meid, kind).await?;
        info!(%device_id, %kind, "on-demand capture requested");
        self.request_refresh();
        Ok(ack)
    }

    /// [`request_capture()`](Self::request_capture) for a device in the
    /// snapshot, checking that it accepts `kind` first.
    pub async fn capture(&self, device_id: DeviceId, kind: CaptureKind) -> Result<Value, CoreError> {
        let entry = self
            .device(device_id)
            .ok_or(CoreError::DeviceNotFound { device_id })?;
        let device = &entry.device;

        if !device.supports(kind) {
            return Err(CoreError::CaptureUnavailable {
                device_id,
                reason: format!("{kind} capture is not enabled"),
            });
        }

        let meid = device.meid.as_deref().unwrap_or_default();
        self.request_capture(device_id, meid, kind).await
    }

    /// Pending high-res and video requests for a device.
    pub async fn pending_requests(&self, device_id: DeviceId) -> Result<Value, CoreError> {
        Ok(self.inner.client.get_pending_requests(device_id).await?)
    }

    // ── Account & media ──────────────────────────────────────────

    /// Never fails: errors read as "no unread notifications".
    pub async fn has_unread_notifications(&self) -> bool {
        self.inner.client.has_unread_notifications().await
    }

    pub async fn account(&self) -> Result<Value, CoreError> {
        Ok(self.inner.client.get_account().await?)
    }

    /// Download the latest image of a device in the snapshot. `None`
    /// when the device has no image yet.
    pub async fn latest_image_bytes(&self, device_id: DeviceId) -> Result<Option<Bytes>, CoreError> {
        let entry = self
            .device(device_id)
            .ok_or(CoreError::DeviceNotFound { device_id })?;

        let url = entry.latest_image.as_ref().and_then(|image| {
            image
                .url
                .as_deref()
                .or(image.enhanced_url.as_deref())
                .filter(|u| !u.is_empty())
        });
        let Some(url) = url else {
            return Ok(None);
        };

        Ok(Some(self.inner.client.fetch_image(url).await?))
    }
}

fn not_found_or(error: moultrie_api::Error, device_id: DeviceId) -> CoreError {
    if error.is_not_found() {
        CoreError::DeviceNotFound { device_id }
    } else {
        error.into()
    }
}

// ── Background task ──────────────────────────────────────────────

/// Poll on the interval and on explicit triggers until cancelled.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = (!period.is_zero()).then(|| {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    if let Some(interval) = interval.as_mut() {
        interval.tick().await; // consume the immediate first tick
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = coordinator.inner.trigger.notified() => debug!("refresh requested"),
            () = next_tick(interval.as_mut()) => {}
        }

        if let Err(CoreError::Cancelled) = coordinator.refresh().await {
            break;
        }
    }
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
