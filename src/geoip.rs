use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use itertools::Itertools;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{ReconError, Result};
use crate::http::HttpFetch;
use crate::model::{GeoIpMap, GeoRecord};
use crate::rate_limiter::RateLimiter;

const NAME: &str = "ip-api.com";

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
    #[serde(rename = "as", default)]
    asn: String,
    #[serde(default)]
    org: String,
    #[serde(default)]
    isp: String,
}

/// IP 地理位置查询
///
/// 顺序执行并经过限速器，每个不同的 IP 只查询一次。
pub struct GeoIpLookup {
    http: Arc<dyn HttpFetch>,
    limiter: Arc<RateLimiter>,
    running: Arc<AtomicBool>,
}

impl GeoIpLookup {
    pub fn new(http: Arc<dyn HttpFetch>, limiter: Arc<RateLimiter>, running: Arc<AtomicBool>) -> Self {
        GeoIpLookup {
            http,
            limiter,
            running,
        }
    }

    pub async fn lookup_all(&self, ips: &[String]) -> GeoIpMap {
        let mut results = GeoIpMap::new();
        let unique: Vec<&String> = ips.iter().unique().collect();
        info!("开始查询 {} 个IP的地理位置", unique.len());

        for ip in unique {
            if !self.running.load(Ordering::Relaxed) {
                warn!("地理位置查询被中止");
                break;
            }

            self.limiter.acquire().await;
            let record = match self.lookup_one(ip).await {
                Ok(record) => {
                    info!("GeoIP: {} -> {}, {}", ip, record.country, record.org);
                    Some(record)
                }
                Err(e) => {
                    debug!("GeoIP 查询失败 {}: {}", ip, e);
                    None
                }
            };
            results.insert(ip.clone(), record);
        }

        results
    }

    async fn lookup_one(&self, ip: &str) -> Result<GeoRecord> {
        let url = format!("http://ip-api.com/json/{}", ip);
        let response = self.http.get(&url).await?;
        let body = response.body.unwrap_or_default();

        let data: IpApiResponse = serde_json::from_str(&body).map_err(|e| ReconError::Payload {
            source_name: NAME.to_string(),
            reason: e.to_string(),
        })?;

        if data.status != "success" {
            return Err(ReconError::Payload {
                source_name: NAME.to_string(),
                reason: format!("status={}", data.status),
            });
        }

        Ok(GeoRecord {
            country: data.country,
            city: data.city,
            asn: data.asn,
            org: data.org,
            isp: data.isp,
        })
    }
}
