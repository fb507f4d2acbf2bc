use std::path::PathBuf;
use std::time::Duration;

use log::error;

use crate::error::{ReconError, Result};
use crate::wordlist;

/// 默认并发数
pub const DEFAULT_THREADS: usize = 30;
/// 并发数上限
pub const MAX_THREADS: usize = 10_000;
/// 默认 User-Agent
pub const USER_AGENT: &str = "ShunyaRecon/1.0";

/// 速率限制: 每 `interval` 内最多 `tokens` 次请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub tokens: u32,
    pub interval: Duration,
}

impl RateLimit {
    pub const fn new(tokens: u32, interval_ms: u64) -> Self {
        RateLimit {
            tokens,
            interval: Duration::from_millis(interval_ms),
        }
    }
}

/// 各数据源的速率限制
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub crtsh: RateLimit,
    pub bufferover: RateLimit,
    pub geoip: RateLimit,
}

impl Default for RateLimits {
    fn default() -> Self {
        RateLimits {
            crtsh: RateLimit::new(5, 1000),
            bufferover: RateLimit::new(2, 1000),
            // ip-api.com 免费接口限制 45 次/分钟
            geoip: RateLimit::new(45, 60_000),
        }
    }
}

/// DNS解析重试策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数
    pub attempts: u32,
    /// 单次尝试超时
    pub timeout: Duration,
    /// 线性退避基数，第 n 次失败后等待 `backoff_base * n`
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            timeout: Duration::from_secs(5),
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// 字典来源: 文件路径或内存中的列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordlistSource {
    Path(PathBuf),
    Inline(Vec<String>),
}

impl WordlistSource {
    /// 加载字典，读取失败时返回空列表
    pub fn load(&self) -> Vec<String> {
        match self {
            WordlistSource::Path(path) => wordlist::load_wordlist(path),
            WordlistSource::Inline(words) => wordlist::clean_tokens(words.iter()),
        }
    }

    /// 在阻塞线程池中加载，文件读取不占用异步工作线程
    pub async fn load_async(&self) -> Vec<String> {
        let source = self.clone();
        match tokio::task::spawn_blocking(move || source.load()).await {
            Ok(words) => words,
            Err(e) => {
                error!("加载字典任务异常退出: {}", e);
                Vec::new()
            }
        }
    }
}

/// HTTP 请求参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub max_redirects: usize,
}

/// 侦察配置
#[derive(Debug, Clone)]
pub struct ReconConfig {
    /// 目标域名
    pub domain: String,
    /// 各工作池的并发数
    pub threads: usize,
    /// 子域名字典
    pub wordlist: Option<WordlistSource>,
    /// 是否进行HTTP/HTTPS存活探测
    pub probe: bool,
    /// 是否查询IP地理位置
    pub geoip: bool,
    /// 目录扫描字典，`Some` 时启用目录扫描
    pub dirscan: Option<WordlistSource>,
    pub retry: RetryPolicy,
    pub probe_http: HttpSettings,
    pub dirscan_http: HttpSettings,
    pub geoip_timeout: Duration,
    pub rate_limits: RateLimits,
    pub crtsh_timeout: Duration,
    pub alienvault_timeout: Duration,
    pub bufferover_timeout: Duration,
    pub user_agent: String,
}

impl Default for ReconConfig {
    fn default() -> Self {
        ReconConfig {
            domain: String::new(),
            threads: DEFAULT_THREADS,
            wordlist: None,
            probe: false,
            geoip: false,
            dirscan: None,
            retry: RetryPolicy::default(),
            probe_http: HttpSettings {
                timeout: Duration::from_secs(8),
                max_redirects: 3,
            },
            dirscan_http: HttpSettings {
                timeout: Duration::from_secs(8),
                max_redirects: 2,
            },
            geoip_timeout: Duration::from_secs(7),
            rate_limits: RateLimits::default(),
            crtsh_timeout: Duration::from_secs(60),
            alienvault_timeout: Duration::from_secs(10),
            bufferover_timeout: Duration::from_secs(10),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ReconConfig {
    pub fn for_domain(domain: impl Into<String>) -> Self {
        ReconConfig {
            domain: domain.into(),
            ..Default::default()
        }
    }

    /// 校验配置，必须在任何网络活动之前调用
    pub fn validate(&self) -> Result<()> {
        let domain = self.domain.trim();
        if domain.is_empty() {
            return Err(ReconError::MissingDomain);
        }
        if domain.contains(char::is_whitespace) || domain.contains('/') || domain.starts_with('.') {
            return Err(ReconError::InvalidDomain(self.domain.clone()));
        }
        if self.threads == 0 || self.threads > MAX_THREADS {
            return Err(ReconError::InvalidThreads(self.threads));
        }
        if self.retry.attempts == 0 {
            return Err(ReconError::InvalidRetry(self.retry.attempts));
        }
        Ok(())
    }
}
