use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use itertools::Itertools;
use log::{debug, info};

use crate::config::ReconConfig;
use crate::dirscan::DirScanner;
use crate::dns_resolver::{DnsLookup, DnsResolver, ResolutionPool};
use crate::error::Result;
use crate::geoip::GeoIpLookup;
use crate::http::{HttpFetch, ReqwestFetcher};
use crate::model::{ResolutionRecord, RunResult};
use crate::pool::WorkerPool;
use crate::rate_limiter::RateLimiter;
use crate::sources::{self, SubdomainSource};
use crate::util::{merge_candidates, normalize_hostname};
use crate::verify::ProbePool;
use crate::wordlist::expand_subdomains;

/// 引擎依赖的外部组件
///
/// 默认由 [`EngineParts::from_config`] 创建，测试中可以替换为任意实现。
pub struct EngineParts {
    pub sources: Vec<Arc<dyn SubdomainSource>>,
    pub lookup: Arc<dyn DnsLookup>,
    pub probe_http: Arc<dyn HttpFetch>,
    pub dirscan_http: Arc<dyn HttpFetch>,
    pub geoip_http: Arc<dyn HttpFetch>,
    pub geoip_limiter: Arc<RateLimiter>,
}

impl EngineParts {
    pub fn from_config(config: &ReconConfig) -> Result<Self> {
        let ua = config.user_agent.as_str();
        Ok(EngineParts {
            sources: sources::default_sources(config)?,
            lookup: Arc::new(DnsResolver::new(&config.retry)),
            probe_http: Arc::new(ReqwestFetcher::from_settings(&config.probe_http, ua)?),
            dirscan_http: Arc::new(ReqwestFetcher::from_settings(&config.dirscan_http, ua)?),
            geoip_http: Arc::new(ReqwestFetcher::new(config.geoip_timeout, 5, ua)?),
            geoip_limiter: Arc::new(RateLimiter::from_limit(config.rate_limits.geoip)),
        })
    }
}

/// 侦察引擎
///
/// 按顺序执行: 子域名收集 → DNS解析 → 存活探测 → 地理位置 → 目录扫描。
/// 每个阶段都在前一阶段全部完成后才开始。
pub struct ReconEngine {
    config: ReconConfig,
    domain: String,
    parts: EngineParts,
    running: Arc<AtomicBool>,
}

impl ReconEngine {
    /// 创建引擎，配置错误会在此处返回
    pub fn new(config: ReconConfig) -> Result<Self> {
        config.validate()?;
        let parts = EngineParts::from_config(&config)?;
        Self::with_parts(config, parts)
    }

    /// 使用自定义组件创建引擎
    pub fn with_parts(config: ReconConfig, parts: EngineParts) -> Result<Self> {
        config.validate()?;
        let domain = normalize_hostname(&config.domain);
        Ok(ReconEngine {
            config,
            domain,
            parts,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// 停止标志，置为 `false` 后各工作池不再领取新任务
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    fn worker_pool(&self) -> WorkerPool {
        WorkerPool::new(self.config.threads, Arc::clone(&self.running))
    }

    /// 执行一次完整的侦察
    ///
    /// 单个操作的失败不会中断运行，只会体现在结果中。
    pub async fn run(&self) -> RunResult {
        info!("目标域名: {}", self.domain);

        let candidates = self.enumerate().await;
        info!("候选子域名数量: {}", candidates.len());

        let resolver = ResolutionPool::new(
            Arc::clone(&self.parts.lookup),
            self.config.retry.clone(),
            self.worker_pool(),
        );
        let mut subdomains = resolver.resolve_many(candidates).await;
        for record in &subdomains {
            if record.resolved {
                info!("[+] 解析成功: {} -> {}", record.subdomain, record.ip.join(", "));
            } else {
                debug!("[-] 解析失败: {}", record.subdomain);
            }
        }

        if self.config.probe {
            let prober = ProbePool::new(Arc::clone(&self.parts.probe_http), self.worker_pool());
            prober.probe_records(&mut subdomains).await;
        }

        let geoip = if self.config.geoip {
            let lookup = GeoIpLookup::new(
                Arc::clone(&self.parts.geoip_http),
                Arc::clone(&self.parts.geoip_limiter),
                Arc::clone(&self.running),
            );
            Some(lookup.lookup_all(&unique_first_ips(&subdomains)).await)
        } else {
            None
        };

        let dirscan = match &self.config.dirscan {
            Some(source) => {
                let wordlist = source.load_async().await;
                let hosts: Vec<String> = subdomains
                    .iter()
                    .filter(|record| record.resolved)
                    .map(|record| format!("http://{}", record.subdomain))
                    .collect();
                let scanner = DirScanner::new(Arc::clone(&self.parts.dirscan_http), self.worker_pool());
                Some(scanner.scan(&hosts, &wordlist).await)
            }
            None => None,
        };

        let result = RunResult {
            domain: self.domain.clone(),
            timestamp: Utc::now(),
            subdomains,
            geoip,
            dirscan,
        };
        info!(
            "完成: 共 {} 个子域名, 解析成功 {}, 失败 {}",
            result.subdomains.len(),
            result.resolved_count(),
            result.failed_count()
        );
        result
    }

    /// 从所有被动数据源和字典收集候选子域名
    pub async fn enumerate(&self) -> Vec<String> {
        let domain = self.domain.as_str();
        let passive = join_all(self.parts.sources.iter().map(|source| source.fetch(domain))).await;

        let words = match &self.config.wordlist {
            Some(source) => source.load_async().await,
            None => Vec::new(),
        };
        let guessed = expand_subdomains(&words, domain);

        // 集合本身无序，排序后输出才稳定
        let all = passive
            .into_iter()
            .flat_map(|hosts| hosts.into_iter().sorted())
            .chain(guessed);
        merge_candidates(all)
    }
}

/// 每条已解析记录取第一个IP，去重后保持出现顺序
pub fn unique_first_ips(records: &[ResolutionRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(ResolutionRecord::first_ip)
        .unique()
        .map(str::to_string)
        .collect()
}

/// 便捷函数: 校验配置并执行一次侦察
pub async fn run(config: ReconConfig) -> Result<RunResult> {
    let engine = ReconEngine::new(config)?;
    Ok(engine.run().await)
}
