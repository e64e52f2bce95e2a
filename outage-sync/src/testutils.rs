use async_trait::async_trait;
use serde_json::{Value, json};
use site_api::{Outage, SiteApi, SiteApiError, SiteInfo, SiteOutage};
use std::sync::Mutex;

/// In-memory `SiteApi` that serves fixed data and records what was asked of it.
pub struct StaticSiteApi {
    outages: Vec<Outage>,
    site: SiteInfo,
    fail: bool,
    site_info_requests: Mutex<Vec<String>>,
    submitted: Mutex<Vec<(String, Vec<SiteOutage>)>>,
}

impl StaticSiteApi {
    pub fn new(outages: Vec<Outage>, site: SiteInfo) -> Self {
        StaticSiteApi {
            outages,
            site,
            fail: false,
            site_info_requests: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the service could not be reached.
    pub fn failing() -> Self {
        StaticSiteApi {
            fail: true,
            ..Self::new(Vec::new(), SiteInfo::default())
        }
    }

    pub fn site_info_requests(&self) -> Vec<String> {
        self.site_info_requests.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<(String, Vec<SiteOutage>)> {
        self.submitted.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), SiteApiError> {
        if self.fail {
            return Err(SiteApiError::InvalidUrl("unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SiteApi for StaticSiteApi {
    async fn list_outages(&self) -> Result<Vec<Outage>, SiteApiError> {
        self.check()?;
        Ok(self.outages.clone())
    }

    async fn fetch_site_info(&self, site_id: &str) -> Result<SiteInfo, SiteApiError> {
        self.check()?;
        self.site_info_requests
            .lock()
            .unwrap()
            .push(site_id.to_string());
        Ok(self.site.clone())
    }

    async fn submit_site_outages(
        &self,
        site_id: &str,
        outages: &[SiteOutage],
    ) -> Result<Option<Value>, SiteApiError> {
        self.check()?;
        self.submitted
            .lock()
            .unwrap()
            .push((site_id.to_string(), outages.to_vec()));
        Ok(Some(json!({"status": "success"})))
    }
}
