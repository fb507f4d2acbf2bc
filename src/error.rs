use std::io;
use std::time::Duration;

use thiserror::Error;

/// 侦察过程中的错误
///
/// 只有配置类错误会返回给调用方，网络类错误都在各个工作池内部被吸收，
/// 转换成未解析记录、空结果或 `None`。
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("未指定目标域名")]
    MissingDomain,

    #[error("无效的目标域名: {0}")]
    InvalidDomain(String),

    #[error("无效的并发数: {0} (有效范围 1-{max})", max = crate::config::MAX_THREADS)]
    InvalidThreads(usize),

    #[error("无效的重试次数: {0}")]
    InvalidRetry(u32),

    #[error("请求超时 ({0:?})")]
    Timeout(Duration),

    #[error("DNS解析失败: {0}")]
    Dns(#[from] trust_dns_resolver::error::ResolveError),

    #[error("HTTP请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} 返回异常状态码: {status}")]
    HttpStatus { source_name: String, status: u16 },

    #[error("{source_name} 响应内容无法解析: {reason}")]
    Payload { source_name: String, reason: String },

    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("不支持的输出格式: {0}。支持的格式: table, json, csv, txt")]
    UnsupportedFormat(String),
}

impl ReconError {
    /// 是否属于配置错误（需要在任何网络活动之前终止）
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ReconError::MissingDomain
                | ReconError::InvalidDomain(_)
                | ReconError::InvalidThreads(_)
                | ReconError::InvalidRetry(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
