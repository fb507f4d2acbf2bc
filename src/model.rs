use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 子域名解析记录
///
/// 由解析池为每个候选域名创建一条，探测池随后在原记录上补充
/// `status_code` 与 `title`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRecord {
    pub subdomain: String,
    /// 解析顺序与解析器返回一致
    pub ip: Vec<String>,
    pub resolved: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ResolutionRecord {
    /// 解析成功，`ip` 为空时视为未解析
    pub fn resolved(subdomain: impl Into<String>, ip: Vec<String>) -> Self {
        let resolved = !ip.is_empty();
        ResolutionRecord {
            subdomain: subdomain.into(),
            ip,
            resolved,
            timestamp: Utc::now(),
            status_code: None,
            title: None,
        }
    }

    pub fn unresolved(subdomain: impl Into<String>) -> Self {
        Self::resolved(subdomain, Vec::new())
    }

    pub fn first_ip(&self) -> Option<&str> {
        self.ip.first().map(String::as_str)
    }
}

/// IP 地理位置信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub country: String,
    pub city: String,
    pub asn: String,
    pub org: String,
    pub isp: String,
}

/// IP → 地理位置，查询失败的 IP 对应 `None`
pub type GeoIpMap = BTreeMap<String, Option<GeoRecord>>;

/// 目录扫描发现
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFinding {
    pub path: String,
    pub status: u16,
    pub length: u64,
    pub url: String,
}

/// 一次侦察运行的最终结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub domain: String,
    pub timestamp: DateTime<Utc>,
    pub subdomains: Vec<ResolutionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoip: Option<GeoIpMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirscan: Option<Vec<DirectoryFinding>>,
}

impl RunResult {
    pub fn resolved(&self) -> impl Iterator<Item = &ResolutionRecord> {
        self.subdomains.iter().filter(|record| record.resolved)
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved().count()
    }

    pub fn failed_count(&self) -> usize {
        self.subdomains.len() - self.resolved_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_flag_follows_ip() {
        let record = ResolutionRecord::resolved("a.example.com", vec!["1.2.3.4".to_string()]);
        assert!(record.resolved);
        assert_eq!(record.first_ip(), Some("1.2.3.4"));

        let record = ResolutionRecord::resolved("b.example.com", Vec::new());
        assert!(!record.resolved);
        assert!(record.first_ip().is_none());
    }

    #[test]
    fn test_record_serialization() {
        let mut record = ResolutionRecord::resolved("a.example.com", vec!["1.2.3.4".to_string()]);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("statusCode").is_none());
        assert!(json.get("title").is_none());

        record.status_code = Some(200);
        record.title = Some("Example".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["title"], "Example");
        assert_eq!(json["ip"][0], "1.2.3.4");
    }

    #[test]
    fn test_optional_sections_present_when_empty() {
        let result = RunResult {
            domain: "example.com".to_string(),
            timestamp: Utc::now(),
            subdomains: Vec::new(),
            geoip: Some(GeoIpMap::new()),
            dirscan: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("geoip").is_some());
        assert!(json.get("dirscan").is_none());
    }
}
