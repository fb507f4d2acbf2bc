use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{redirect, Client};
use tokio::time::timeout;

use crate::config::HttpSettings;
use crate::error::{ReconError, Result};

/// HTTP 响应的摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// `Content-Length` 响应头
    pub content_length: Option<u64>,
    /// 响应体，读取失败时为 `None`
    pub body: Option<String>,
}

impl HttpResponse {
    /// 内容长度，优先使用响应头，否则取响应体长度
    pub fn length(&self) -> u64 {
        self.content_length
            .or_else(|| self.body.as_ref().map(|body| body.len() as u64))
            .unwrap_or(0)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 发送 GET 请求的抽象，任何状态码都视为正常响应
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// 基于 reqwest 的实现
pub struct ReqwestFetcher {
    client: Client,
    timeout_duration: Duration,
}

impl ReqwestFetcher {
    pub fn new(timeout_duration: Duration, max_redirects: usize, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout_duration)
            .redirect(redirect::Policy::limited(max_redirects))
            .danger_accept_invalid_certs(true) // 接受无效证书
            .user_agent(user_agent)
            .build()?;

        Ok(ReqwestFetcher {
            client,
            timeout_duration,
        })
    }

    pub fn from_settings(settings: &HttpSettings, user_agent: &str) -> Result<Self> {
        Self::new(settings.timeout, settings.max_redirects, user_agent)
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = timeout(self.timeout_duration, self.client.get(url).send())
            .await
            .map_err(|_| ReconError::Timeout(self.timeout_duration))??;

        let status = response.status().as_u16();
        let content_length = response.content_length();

        // 状态码已经到达，响应体读取失败或超时只丢弃响应体
        let body = match timeout(self.timeout_duration, response.text()).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                debug!("读取响应体失败 {}: {}", url, e);
                None
            }
            Err(_) => {
                debug!("读取响应体超时 {}", url);
                None
            }
        };

        Ok(HttpResponse {
            status,
            content_length,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefers_header() {
        let response = HttpResponse {
            status: 200,
            content_length: Some(1234),
            body: Some("short".to_string()),
        };
        assert_eq!(response.length(), 1234);
    }

    #[test]
    fn test_length_falls_back_to_body() {
        let response = HttpResponse {
            status: 403,
            content_length: None,
            body: Some("forbidden".to_string()),
        };
        assert_eq!(response.length(), 9);
        assert!(!response.is_success());

        let empty = HttpResponse {
            status: 500,
            content_length: None,
            body: None,
        };
        assert_eq!(empty.length(), 0);
    }

    #[tokio::test]
    async fn test_stalled_body_keeps_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // 只发送响应头和少量响应体，然后保持连接不再发送
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000000\r\n\r\nPK")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let fetcher = ReqwestFetcher::new(Duration::from_secs(1), 2, "ShunyaRecon/1.0").unwrap();
        let response = fetcher.get(&format!("http://{}/backup.zip", addr)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_length, Some(1_000_000));
        assert_eq!(response.body, None);
        assert_eq!(response.length(), 1_000_000);
        server.abort();
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = ReqwestFetcher::new(Duration::from_secs(1), 2, "ShunyaRecon/1.0").unwrap();
        assert!(fetcher.get(&format!("http://{}/", addr)).await.is_err());
    }

    #[test]
    fn test_fetcher_builds() {
        let fetcher = ReqwestFetcher::new(Duration::from_secs(8), 3, "ShunyaRecon/1.0");
        assert!(fetcher.is_ok());
    }
}
