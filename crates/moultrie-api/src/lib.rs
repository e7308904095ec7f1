// moultrie-api: Async Rust client for the Moultrie Mobile cloud API
//
// Two surfaces live here: the Azure AD B2C login (PKCE authorization-code
// flow plus refresh) and the consumer REST API behind a bearer token.

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

mod account;
mod devices;
mod images;

pub use auth::claims::TokenClaims;
pub use auth::login::LoginFlow;
pub use auth::token::{Credentials, TokenManager, TokenPair, TokenResponse};
pub use client::ApiClient;
pub use endpoints::Endpoints;
pub use error::Error;
pub use models::{
    CaptureKind, DeviceId, DeviceRecord, ImageQuery, ImageRecord, SettingOption, SettingRecord,
    SettingsGroup, Subscription,
};
pub use transport::TransportConfig;
