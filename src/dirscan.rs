use std::sync::Arc;

use log::{debug, info, warn};

use crate::http::HttpFetch;
use crate::model::DirectoryFinding;
use crate::pool::WorkerPool;

/// 视为噪声的状态码
const UNINTERESTING: [u16; 2] = [400, 404];

pub fn is_interesting(status: u16) -> bool {
    !UNINTERESTING.contains(&status)
}

/// 目录暴破工作池
///
/// 所有 (主机, 路径) 组合放入同一个共享队列，由固定数量的工作任务逐个领取。
pub struct DirScanner {
    http: Arc<dyn HttpFetch>,
    pool: WorkerPool,
}

impl DirScanner {
    pub fn new(http: Arc<dyn HttpFetch>, pool: WorkerPool) -> Self {
        DirScanner { http, pool }
    }

    /// `hosts` 为基础URL（如 `http://a.example.com`），结果按URL排序
    pub async fn scan(&self, hosts: &[String], wordlist: &[String]) -> Vec<DirectoryFinding> {
        let paths: Vec<&str> = wordlist
            .iter()
            .map(|word| word.trim().trim_start_matches('/'))
            .filter(|word| !word.is_empty())
            .collect();

        let jobs: Vec<(String, String)> = hosts
            .iter()
            .flat_map(|host| {
                let base = host.trim_end_matches('/').to_string();
                paths.iter().map(move |path| (base.clone(), format!("/{}", path)))
            })
            .collect();
        info!("开始目录扫描: {} 个主机, {} 个任务", hosts.len(), jobs.len());

        let http = Arc::clone(&self.http);
        let run = self
            .pool
            .run(jobs, move |(base, path)| {
                let http = Arc::clone(&http);
                async move { check_path(http.as_ref(), &base, &path).await }
            })
            .await;

        if !run.skipped.is_empty() {
            warn!("目录扫描被中止，{} 个任务未处理", run.skipped.len());
        }

        let mut findings: Vec<DirectoryFinding> = run.completed.into_iter().flatten().collect();
        findings.sort_by(|a, b| a.url.cmp(&b.url));
        findings
    }
}

async fn check_path(http: &dyn HttpFetch, base: &str, path: &str) -> Option<DirectoryFinding> {
    let url = format!("{}{}", base, path);
    match http.get(&url).await {
        Ok(response) if is_interesting(response.status) => {
            info!("[+] {} {}", response.status, url);
            Some(DirectoryFinding {
                path: path.to_string(),
                status: response.status,
                length: response.length(),
                url,
            })
        }
        Ok(response) => {
            debug!("[-] {} {}", response.status, url);
            None
        }
        Err(e) => {
            debug!("[!] {} 请求失败: {}", url, e);
            None
        }
    }
}
