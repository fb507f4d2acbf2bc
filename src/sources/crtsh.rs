use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use super::{collect_hosts, SubdomainSource};
use crate::error::{ReconError, Result};
use crate::http::HttpFetch;
use crate::rate_limiter::RateLimiter;

const NAME: &str = "crt.sh";

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    name_value: String,
}

/// 证书透明日志 crt.sh
pub struct CrtSh {
    http: Arc<dyn HttpFetch>,
    limiter: Option<Arc<RateLimiter>>,
}

impl CrtSh {
    pub fn new(http: Arc<dyn HttpFetch>, limiter: Option<Arc<RateLimiter>>) -> Self {
        CrtSh { http, limiter }
    }
}

#[async_trait]
impl SubdomainSource for CrtSh {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn try_fetch(&self, domain: &str) -> Result<HashSet<String>> {
        let url = format!("https://crt.sh/?q=%25.{}&output=json", domain);
        debug!("{:12} - {}", "HTTP REQUEST", url);

        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        let response = self.http.get(&url).await?;

        if !response.is_success() {
            return Err(ReconError::HttpStatus {
                source_name: NAME.to_string(),
                status: response.status,
            });
        }

        let body = response.body.unwrap_or_default();
        let entries: Vec<CrtShEntry> =
            serde_json::from_str(&body).map_err(|e| ReconError::Payload {
                source_name: NAME.to_string(),
                reason: e.to_string(),
            })?;

        // 一条证书记录可能包含多个换行分隔的名称
        let names = entries
            .iter()
            .flat_map(|entry| entry.name_value.split('\n'))
            .map(str::to_string)
            .collect::<Vec<_>>();

        Ok(collect_hosts(names, domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::StaticFetcher;

    const URL: &str = "https://crt.sh/?q=%25.example.com&output=json";

    #[tokio::test]
    async fn test_parse_entries() {
        let body = r#"[
            {"name_value": "www.example.com\nMAIL.example.com"},
            {"name_value": "*.example.com"},
            {"name_value": "other.org"}
        ]"#;
        let source = CrtSh::new(Arc::new(StaticFetcher::new().respond(URL, 200, body)), None);

        let hosts = source.fetch("example.com").await;
        let mut hosts: Vec<_> = hosts.into_iter().collect();
        hosts.sort();
        assert_eq!(hosts, vec!["mail.example.com", "www.example.com"]);
    }

    #[tokio::test]
    async fn test_error_status_yields_empty() {
        let source = CrtSh::new(
            Arc::new(StaticFetcher::new().respond(URL, 502, "bad gateway")),
            None,
        );
        assert!(matches!(
            source.try_fetch("example.com").await,
            Err(ReconError::HttpStatus { status: 502, .. })
        ));
        assert!(source.fetch("example.com").await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_yields_empty() {
        let source = CrtSh::new(
            Arc::new(StaticFetcher::new().respond(URL, 200, "<html>")),
            None,
        );
        assert!(source.fetch("example.com").await.is_empty());
    }
}
