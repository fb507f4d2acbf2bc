use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use super::{collect_hosts, SubdomainSource};
use crate::error::{ReconError, Result};
use crate::http::HttpFetch;

const NAME: &str = "alienvault";

#[derive(Debug, Deserialize)]
struct PassiveDnsResponse {
    #[serde(default)]
    passive_dns: Vec<PassiveDnsEntry>,
}

#[derive(Debug, Deserialize)]
struct PassiveDnsEntry {
    #[serde(default)]
    hostname: String,
}

/// AlienVault OTX 被动DNS
pub struct AlienVault {
    http: Arc<dyn HttpFetch>,
}

impl AlienVault {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        AlienVault { http }
    }
}

#[async_trait]
impl SubdomainSource for AlienVault {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn try_fetch(&self, domain: &str) -> Result<HashSet<String>> {
        let url = format!(
            "https://otx.alienvault.com/api/v1/indicators/domain/{}/passive_dns",
            domain
        );
        debug!("{:12} - {}", "HTTP REQUEST", url);

        let response = self.http.get(&url).await?;
        if !response.is_success() {
            return Err(ReconError::HttpStatus {
                source_name: NAME.to_string(),
                status: response.status,
            });
        }

        let body = response.body.unwrap_or_default();
        let data: PassiveDnsResponse =
            serde_json::from_str(&body).map_err(|e| ReconError::Payload {
                source_name: NAME.to_string(),
                reason: e.to_string(),
            })?;

        Ok(collect_hosts(
            data.passive_dns.into_iter().map(|entry| entry.hostname),
            domain,
        ))
    }
}
