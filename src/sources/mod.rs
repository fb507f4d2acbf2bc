//! 被动数据源
//!
//! 每个数据源把目标域名映射成候选子域名集合。任何失败（网络错误、
//! 异常状态码、无法解析的响应）都只记录日志并返回空集合。

pub mod alienvault;
pub mod bufferover;
pub mod crtsh;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use crate::config::ReconConfig;
use crate::error::Result;
use crate::http::ReqwestFetcher;
use crate::rate_limiter::RateLimiter;
use crate::util::{belongs_to_domain, normalize_hostname};

pub use alienvault::AlienVault;
pub use bufferover::BufferOver;
pub use crtsh::CrtSh;

/// 被动子域名数据源
#[async_trait]
pub trait SubdomainSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// 查询数据源，可能失败
    async fn try_fetch(&self, domain: &str) -> Result<HashSet<String>>;

    /// 查询数据源，失败时返回空集合
    async fn fetch(&self, domain: &str) -> HashSet<String> {
        match self.try_fetch(domain).await {
            Ok(subdomains) => {
                info!("{} 发现 {} 个子域名", self.name(), subdomains.len());
                subdomains
            }
            Err(e) => {
                warn!("{} 查询失败: {}", self.name(), e);
                HashSet::new()
            }
        }
    }
}

/// 规范化并只保留属于目标域名的主机名
pub(crate) fn collect_hosts<I, S>(hosts: I, domain: &str) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    hosts
        .into_iter()
        .map(|host| normalize_hostname(host.as_ref()))
        .filter(|host| !host.is_empty() && !host.starts_with('*'))
        .filter(|host| belongs_to_domain(host, domain))
        .collect()
}

/// 按配置创建默认数据源
pub fn default_sources(config: &ReconConfig) -> Result<Vec<Arc<dyn SubdomainSource>>> {
    let ua = config.user_agent.as_str();

    let crtsh = CrtSh::new(
        Arc::new(ReqwestFetcher::new(config.crtsh_timeout, 5, ua)?),
        Some(Arc::new(RateLimiter::from_limit(config.rate_limits.crtsh))),
    );
    let alienvault = AlienVault::new(Arc::new(ReqwestFetcher::new(
        config.alienvault_timeout,
        5,
        ua,
    )?));
    let bufferover = BufferOver::new(
        Arc::new(ReqwestFetcher::new(config.bufferover_timeout, 5, ua)?),
        Some(Arc::new(RateLimiter::from_limit(config.rate_limits.bufferover))),
    );

    Ok(vec![Arc::new(crtsh), Arc::new(alienvault), Arc::new(bufferover)])
}
