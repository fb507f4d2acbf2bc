use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::time::{sleep, timeout};
use trust_dns_resolver::config::*;
use trust_dns_resolver::TokioAsyncResolver;

use crate::config::RetryPolicy;
use crate::error::Result;
use crate::model::ResolutionRecord;
use crate::pool::WorkerPool;

/// 单次DNS查询的抽象
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// 基于 trust-dns 的解析器
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// 重试由解析池负责，这里只做单次尝试
    pub fn new(policy: &RetryPolicy) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = policy.timeout;
        opts.attempts = 1;
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);
        DnsResolver { resolver }
    }
}

#[async_trait]
impl DnsLookup for DnsResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        let response = self.resolver.lookup_ip(host).await?;
        Ok(response.iter().collect())
    }
}

/// 解析单个域名，带超时与线性退避重试
///
/// 永远返回一条记录，所有尝试失败时记录为未解析。
pub async fn resolve_one(lookup: &dyn DnsLookup, policy: &RetryPolicy, host: &str) -> ResolutionRecord {
    for attempt in 1..=policy.attempts {
        match timeout(policy.timeout, lookup.lookup(host)).await {
            Ok(Ok(ips)) if !ips.is_empty() => {
                let ips = ips.iter().map(ToString::to_string).collect();
                return ResolutionRecord::resolved(host, ips);
            }
            Ok(Ok(_)) => debug!("{} 无地址记录 (第{}次)", host, attempt),
            Ok(Err(e)) => debug!("{} 解析失败 (第{}次): {}", host, attempt, e),
            Err(_) => debug!("{} 解析超时 (第{}次)", host, attempt),
        }

        if attempt < policy.attempts {
            sleep(policy.backoff_for(attempt)).await;
        }
    }

    ResolutionRecord::unresolved(host)
}

/// DNS解析工作池
pub struct ResolutionPool {
    lookup: Arc<dyn DnsLookup>,
    policy: RetryPolicy,
    pool: WorkerPool,
}

impl ResolutionPool {
    pub fn new(lookup: Arc<dyn DnsLookup>, policy: RetryPolicy, pool: WorkerPool) -> Self {
        ResolutionPool {
            lookup,
            policy,
            pool,
        }
    }

    pub async fn resolve_one(&self, host: &str) -> ResolutionRecord {
        resolve_one(self.lookup.as_ref(), &self.policy, host).await
    }

    /// 批量解析
    ///
    /// 每个不同的输入域名恰好对应一条输出记录，输出按输入顺序排列。
    pub async fn resolve_many(&self, hosts: Vec<String>) -> Vec<ResolutionRecord> {
        let mut seen = HashSet::new();
        let hosts: Vec<String> = hosts.into_iter().filter(|h| seen.insert(h.clone())).collect();
        info!("开始解析 {} 个候选域名 (并发 {})", hosts.len(), self.pool.threads());

        let lookup = Arc::clone(&self.lookup);
        let policy = self.policy.clone();
        let run = self
            .pool
            .run(hosts.clone(), move |host| {
                let lookup = Arc::clone(&lookup);
                let policy = policy.clone();
                async move { resolve_one(lookup.as_ref(), &policy, &host).await }
            })
            .await;

        if !run.skipped.is_empty() {
            warn!("解析被中止，{} 个域名未处理", run.skipped.len());
        }

        let mut by_host: HashMap<String, ResolutionRecord> = run
            .completed
            .into_iter()
            .map(|record| (record.subdomain.clone(), record))
            .collect();

        hosts
            .into_iter()
            .map(|host| {
                by_host
                    .remove(&host)
                    .unwrap_or_else(|| ResolutionRecord::unresolved(host))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconError;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    /// 前 `failures` 次失败，之后返回固定地址
    struct FlakyLookup {
        failures: u32,
        calls: AtomicU32,
        called_at: std::sync::Mutex<Vec<Instant>>,
        ips: Vec<IpAddr>,
    }

    impl FlakyLookup {
        fn new(failures: u32, ips: Vec<IpAddr>) -> Self {
            FlakyLookup {
                failures,
                calls: AtomicU32::new(0),
                called_at: std::sync::Mutex::new(Vec::new()),
                ips,
            }
        }

        /// 相邻两次查询之间的间隔
        fn gaps(&self) -> Vec<Duration> {
            let called_at = self.called_at.lock().unwrap();
            called_at.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    #[async_trait]
    impl DnsLookup for FlakyLookup {
        async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>> {
            self.called_at.lock().unwrap().push(Instant::now());
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(ReconError::Timeout(Duration::from_secs(5)))
            } else {
                Ok(self.ips.clone())
            }
        }
    }

    /// 按主机名返回固定结果，未知主机报错
    struct TableLookup(HashMap<String, Vec<IpAddr>>);

    #[async_trait]
    impl DnsLookup for TableLookup {
        async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
            self.0
                .get(host)
                .cloned()
                .ok_or(ReconError::Timeout(Duration::from_secs(5)))
        }
    }

    /// 永不返回
    struct HangingLookup;

    #[async_trait]
    impl DnsLookup for HangingLookup {
        async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>> {
            std::future::pending().await
        }
    }

    fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    fn pool(threads: usize) -> WorkerPool {
        WorkerPool::new(threads, Arc::new(AtomicBool::new(true)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let lookup = FlakyLookup::new(2, vec![ip(1, 2, 3, 4)]);
        let start = Instant::now();

        let record = resolve_one(&lookup, &RetryPolicy::default(), "a.example.com").await;

        assert!(record.resolved);
        assert_eq!(record.ip, vec!["1.2.3.4"]);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            lookup.gaps(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_unresolved() {
        let lookup = FlakyLookup::new(u32::MAX, Vec::new());

        let record = resolve_one(&lookup, &RetryPolicy::default(), "b.example.com").await;

        assert!(!record.resolved);
        assert!(record.ip.is_empty());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout() {
        let policy = RetryPolicy {
            attempts: 2,
            timeout: Duration::from_secs(5),
            backoff_base: Duration::from_millis(500),
        };
        let start = Instant::now();

        let record = resolve_one(&HangingLookup, &policy, "slow.example.com").await;

        assert!(!record.resolved);
        assert_eq!(start.elapsed(), Duration::from_millis(10_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_addresses_kept_in_order() {
        let mut table = HashMap::new();
        table.insert("lb.example.com".to_string(), vec![ip(5, 6, 7, 8), ip(1, 2, 3, 4)]);
        let resolver = ResolutionPool::new(Arc::new(TableLookup(table)), RetryPolicy::default(), pool(2));

        let record = resolver.resolve_one("lb.example.com").await;
        assert_eq!(record.ip, vec!["5.6.7.8", "1.2.3.4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_many_one_record_per_host() {
        let mut table = HashMap::new();
        table.insert("a.example.com".to_string(), vec![ip(1, 2, 3, 4)]);
        let resolver = ResolutionPool::new(Arc::new(TableLookup(table)), RetryPolicy::default(), pool(4));

        let records = resolver
            .resolve_many(vec![
                "a.example.com".to_string(),
                "b.example.com".to_string(),
                "a.example.com".to_string(),
            ])
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subdomain, "a.example.com");
        assert_eq!(records[0].ip, vec!["1.2.3.4"]);
        assert!(records[0].resolved);
        assert_eq!(records[1].subdomain, "b.example.com");
        assert!(records[1].ip.is_empty());
        assert!(!records[1].resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_pool_still_reports_every_host() {
        let resolver = ResolutionPool::new(
            Arc::new(TableLookup(HashMap::new())),
            RetryPolicy::default(),
            WorkerPool::new(2, Arc::new(AtomicBool::new(false))),
        );
        let hosts: Vec<String> = (0..5).map(|i| format!("h{}.example.com", i)).collect();

        let records = resolver.resolve_many(hosts.clone()).await;

        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| !r.resolved));
        assert_eq!(
            records.iter().map(|r| r.subdomain.clone()).collect::<Vec<_>>(),
            hosts
        );
    }
}
