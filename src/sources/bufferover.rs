use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use super::{collect_hosts, SubdomainSource};
use crate::error::{ReconError, Result};
use crate::http::HttpFetch;
use crate::rate_limiter::RateLimiter;

const NAME: &str = "bufferover";

#[derive(Debug, Deserialize)]
struct BufferOverResponse {
    #[serde(rename = "FQDN", default)]
    fqdn: Option<Vec<String>>,
}

/// BufferOver DNS 数据集
pub struct BufferOver {
    http: Arc<dyn HttpFetch>,
    limiter: Option<Arc<RateLimiter>>,
}

impl BufferOver {
    pub fn new(http: Arc<dyn HttpFetch>, limiter: Option<Arc<RateLimiter>>) -> Self {
        BufferOver { http, limiter }
    }
}

#[async_trait]
impl SubdomainSource for BufferOver {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn try_fetch(&self, domain: &str) -> Result<HashSet<String>> {
        let url = format!("https://dns.bufferover.run/dns?q=.{}", domain);
        debug!("{:12} - {}", "HTTP REQUEST", url);

        let response = match &self.limiter {
            Some(limiter) => limiter.wrap(self.http.get(&url)).await?,
            None => self.http.get(&url).await?,
        };
        if !response.is_success() {
            return Err(ReconError::HttpStatus {
                source_name: NAME.to_string(),
                status: response.status,
            });
        }

        let body = response.body.unwrap_or_default();
        let data: BufferOverResponse =
            serde_json::from_str(&body).map_err(|e| ReconError::Payload {
                source_name: NAME.to_string(),
                reason: e.to_string(),
            })?;

        let names = data
            .fqdn
            .unwrap_or_default()
            .into_iter()
            .map(|name| name.trim().trim_end_matches(',').to_string());

        Ok(collect_hosts(names, domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::StaticFetcher;

    const URL: &str = "https://dns.bufferover.run/dns?q=.example.com";

    #[tokio::test(start_paused = true)]
    async fn test_trailing_commas_are_stripped() {
        let body = r#"{"FQDN": ["shop.example.com,", "  blog.example.com", "example.org"]}"#;
        let limiter = Arc::new(RateLimiter::new(2, std::time::Duration::from_secs(1)));
        let source = BufferOver::new(
            Arc::new(StaticFetcher::new().respond(URL, 200, body)),
            Some(limiter),
        );

        let hosts = source.fetch("example.com").await;
        assert_eq!(hosts.len(), 2);
        assert!(hosts.contains("shop.example.com"));
        assert!(hosts.contains("blog.example.com"));
    }

    #[tokio::test]
    async fn test_null_fqdn() {
        let source = BufferOver::new(
            Arc::new(StaticFetcher::new().respond(URL, 200, r#"{"FQDN": null}"#)),
            None,
        );
        assert!(source.fetch("example.com").await.is_empty());
    }
}
