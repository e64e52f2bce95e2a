use crate::metrics_defs::OUTAGES_FETCHED;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use shared::histogram;
use site_api::{Outage, SiteApi, SiteApiError, SiteInfo, SiteOutage};
use std::collections::HashMap;
use std::sync::LazyLock;

static CUTOFF: LazyLock<DateTime<Utc>> = LazyLock::new(|| {
    NaiveDate::from_ymd_opt(2022, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("cutoff is a valid date")
        .and_utc()
});

#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error("site API error: {0}")]
    Api(#[from] SiteApiError),
    #[error("outage {id} has an invalid begin timestamp {value:?}: {source}")]
    InvalidTimestamp {
        id: String,
        value: String,
        source: chrono::ParseError,
    },
}

/// Outages that began before this instant are never submitted.
pub fn cutoff() -> DateTime<Utc> {
    *CUTOFF
}

/// Parses an ISO-8601 timestamp and labels its wall-clock time as UTC.
/// An explicit offset is dropped rather than converted, so
/// `2022-01-01T01:00:00+02:00` reads as 01:00 UTC. A timestamp without an
/// offset is taken as UTC as well.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(timestamp) => Ok(timestamp.naive_local().and_utc()),
        Err(err) => value
            .parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(|_| err),
    }
}

/// Keeps the outages of the site's devices that began at or after `cutoff`
/// and attaches the device name to each. Input order is preserved.
///
/// The begin timestamp is only parsed for outages of known devices, so a
/// malformed timestamp on an unrelated outage is ignored.
pub fn filter_site_outages(
    outages: Vec<Outage>,
    site: &SiteInfo,
    cutoff: DateTime<Utc>,
) -> Result<Vec<SiteOutage>, ProcessError> {
    // Later devices with the same id overwrite earlier ones.
    let device_names: HashMap<&str, &str> = site
        .devices
        .iter()
        .map(|device| (device.id.as_str(), device.name.as_str()))
        .collect();

    let mut retained = Vec::new();
    for outage in outages {
        let Some(&name) = device_names.get(outage.id.as_str()) else {
            continue;
        };

        let begin = parse_timestamp(&outage.begin).map_err(|source| {
            ProcessError::InvalidTimestamp {
                id: outage.id.clone(),
                value: outage.begin.clone(),
                source,
            }
        })?;

        if begin >= cutoff {
            retained.push(SiteOutage::new(outage, name));
        }
    }

    Ok(retained)
}

/// Fetches all outages and the site's devices and returns the outages to
/// submit for the site. Errors are logged and returned unchanged.
pub async fn process_outages(
    api: &dyn SiteApi,
    site_id: &str,
) -> Result<Vec<SiteOutage>, ProcessError> {
    fetch_and_filter(api, site_id)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Outage processing error"))
}

async fn fetch_and_filter(
    api: &dyn SiteApi,
    site_id: &str,
) -> Result<Vec<SiteOutage>, ProcessError> {
    let outages = api.list_outages().await?;
    tracing::info!(count = outages.len(), "Total outages retrieved");
    histogram!(OUTAGES_FETCHED).record(outages.len() as f64);

    let site = api.fetch_site_info(site_id).await?;
    tracing::info!(site_id, "Site info retrieved");
    tracing::debug!(?site, "Site info details");

    let device_ids: Vec<&str> = site.devices.iter().map(|d| d.id.as_str()).collect();
    tracing::info!(devices = ?device_ids, "Devices found");

    let filtered = filter_site_outages(outages, &site, cutoff())?;
    tracing::info!(count = filtered.len(), "Filtered outages");

    Ok(filtered)
}
