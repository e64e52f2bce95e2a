pub mod client;
pub mod config;
pub mod metrics_defs;
pub mod types;

pub use client::{AttemptError, Endpoint, SiteApi, SiteApiClient, SiteApiError};
pub use config::ApiConfig;
pub use types::{Device, Outage, SiteInfo, SiteOutage};
