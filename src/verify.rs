use std::sync::Arc;

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

use crate::http::HttpFetch;
use crate::model::ResolutionRecord;
use crate::pool::WorkerPool;

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
}

/// 存活探测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub url: String,
    pub status: u16,
    pub title: Option<String>,
}

/// 提取HTML标题
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 探测单个主机
///
/// 先尝试 HTTP，任何状态码都算成功；只有请求本身失败时才尝试 HTTPS。
pub async fn probe_host(http: &dyn HttpFetch, host: &str) -> Option<ProbeOutcome> {
    for scheme in ["http", "https"] {
        let url = format!("{}://{}", scheme, host);
        match http.get(&url).await {
            Ok(response) => {
                let title = response.body.as_deref().and_then(extract_title);
                return Some(ProbeOutcome {
                    url,
                    status: response.status,
                    title,
                });
            }
            Err(e) => debug!("探测失败 {}: {}", url, e),
        }
    }
    None
}

/// HTTP/HTTPS 存活探测工作池
pub struct ProbePool {
    http: Arc<dyn HttpFetch>,
    pool: WorkerPool,
}

impl ProbePool {
    pub fn new(http: Arc<dyn HttpFetch>, pool: WorkerPool) -> Self {
        ProbePool { http, pool }
    }

    /// 探测所有已解析的记录，并把结果写回原记录
    ///
    /// 未解析的记录不会被探测。
    pub async fn probe_records(&self, records: &mut [ResolutionRecord]) {
        let targets: Vec<(usize, String)> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.resolved)
            .map(|(index, record)| (index, record.subdomain.clone()))
            .collect();
        info!("开始探测 {} 个已解析域名", targets.len());

        let http = Arc::clone(&self.http);
        let run = self
            .pool
            .run(targets, move |(index, host)| {
                let http = Arc::clone(&http);
                async move { (index, probe_host(http.as_ref(), &host).await) }
            })
            .await;

        for (index, outcome) in run.completed {
            let record = &mut records[index];
            match outcome {
                Some(outcome) => {
                    info!("HTTP {} - {} ({})", outcome.status, record.subdomain, outcome.url);
                    record.status_code = Some(outcome.status);
                    record.title = outcome.title;
                }
                None => {
                    debug!("{} 无HTTP服务", record.subdomain);
                    record.status_code = None;
                    record.title = None;
                }
            }
        }
    }
}
