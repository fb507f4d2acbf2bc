//! # shunya
//!
//! 一个基于Rust实现的并发子域名侦察工具库。
//!
//! ## 特性
//!
//! - 🔍 **被动收集**: crt.sh、AlienVault OTX、BufferOver 三个数据源并发查询，结合字典生成候选子域名
//! - 🚀 **并发解析**: 有界工作池 + 超时 + 线性退避重试，每个候选域名都有一条结果
//! - 🌐 **存活探测**: HTTP优先、HTTPS兜底，提取状态码与页面标题
//! - 🌍 **地理位置**: 每个不同IP只查询一次，带速率限制
//! - 📁 **目录扫描**: 共享任务队列驱动的目录暴破
//! - 📊 **多格式输出**: JSON、CSV、TXT、终端表格
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use shunya::{run, ReconConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let result = run(ReconConfig::for_domain("example.com")).await?;
//!
//!     println!("发现 {} 个子域名", result.subdomains.len());
//!     for record in result.resolved().take(5) {
//!         println!("  {} -> {:?}", record.subdomain, record.ip);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## 高级配置
//!
//! ```rust,no_run
//! use shunya::{ReconConfig, ReconEngine, WordlistSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReconConfig {
//!         threads: 50,
//!         wordlist: Some(WordlistSource::Inline(vec!["www".into(), "api".into()])),
//!         probe: true,      // 启用HTTP/HTTPS探测
//!         geoip: true,      // 启用地理位置查询
//!         dirscan: Some(WordlistSource::Path("dirs.txt".into())),
//!         ..ReconConfig::for_domain("example.com")
//!     };
//!
//!     let engine = ReconEngine::new(config)?;
//!     let result = engine.run().await;
//!
//!     // 处理结果...
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod config;
pub mod dirscan;
pub mod dns_resolver;
pub mod error;
pub mod geoip;
pub mod http;
pub mod input;
pub mod logger;
pub mod model;
pub mod output;
pub mod pool;
pub mod rate_limiter;
pub mod sources;
pub mod util;
pub mod verify;
pub mod wordlist;

// 重新导出主要的公共API
pub use api::{run, unique_first_ips, EngineParts, ReconEngine};
pub use config::{HttpSettings, RateLimit, RateLimits, ReconConfig, RetryPolicy, WordlistSource};
pub use error::{ReconError, Result};

// 导出其他有用的类型
pub use dirscan::DirScanner;
pub use dns_resolver::{resolve_one, DnsLookup, DnsResolver, ResolutionPool};
pub use geoip::GeoIpLookup;
pub use http::{HttpFetch, HttpResponse, ReqwestFetcher};
pub use input::OutputFormat;
pub use model::{DirectoryFinding, GeoIpMap, GeoRecord, ResolutionRecord, RunResult};
pub use output::export_results;
pub use pool::{PoolRun, WorkerPool};
pub use rate_limiter::RateLimiter;
pub use sources::{AlienVault, BufferOver, CrtSh, SubdomainSource};
pub use verify::{ProbeOutcome, ProbePool};
pub use wordlist::load_wordlist;
