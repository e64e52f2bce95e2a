pub mod config;
pub mod logging;
pub mod metrics_defs;
pub mod processing;

#[cfg(test)]
mod testutils;

use config::Config;
use metrics_defs::OUTAGES_SUBMITTED;
use processing::ProcessError;
use shared::histogram;
use site_api::{SiteApi, SiteApiClient, SiteApiError};

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("could not start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("site API error: {0}")]
    Api(#[from] SiteApiError),
    #[error("processing failed: {0}")]
    Process(#[from] ProcessError),
}

/// Runs one sync for the configured site on a single-threaded runtime and
/// returns the number of outages submitted.
pub fn run(config: Config) -> Result<usize, SyncError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SyncError::Runtime)?;
    rt.block_on(run_async(config))
}

pub async fn run_async(config: Config) -> Result<usize, SyncError> {
    tracing::debug!(?config, "Starting outage sync");
    let client = SiteApiClient::new(&config.api, &config.api_key)?;
    sync_site(&client, &config.site_id).await
}

/// Processes the outages of `site_id` and submits the result for the same site.
pub async fn sync_site(api: &dyn SiteApi, site_id: &str) -> Result<usize, SyncError> {
    match process_and_submit(api, site_id).await {
        Ok(count) => {
            tracing::info!("Successfully processed {count} outages for {site_id}");
            Ok(count)
        }
        Err(e) => {
            tracing::error!(error = %e, "Processing failed");
            Err(e)
        }
    }
}

async fn process_and_submit(api: &dyn SiteApi, site_id: &str) -> Result<usize, SyncError> {
    let outages = processing::process_outages(api, site_id).await?;

    let response = api.submit_site_outages(site_id, &outages).await?;
    tracing::debug!(?response, "Submitted site outages");
    histogram!(OUTAGES_SUBMITTED).record(outages.len() as f64);

    Ok(outages.len())
}
