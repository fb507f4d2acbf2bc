use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::config::RateLimit;

/// 令牌桶限速器
///
/// 桶容量为 `tokens`，每个 `interval` 匀速补满。初始为满桶。
pub struct RateLimiter {
    capacity: f64,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(tokens: u32, interval: Duration) -> Self {
        let capacity = tokens.max(1) as f64;
        RateLimiter {
            capacity,
            interval: interval.max(Duration::from_millis(1)),
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn from_limit(limit: RateLimit) -> Self {
        Self::new(limit.tokens, limit.interval)
    }

    /// 获取一个令牌，没有令牌时挂起直到补充
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                self.refill(&mut bucket);

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }

                let missing = 1.0 - bucket.tokens;
                self.interval.mul_f64(missing / self.capacity)
            };
            sleep(wait).await;
        }
    }

    /// 在限速之后执行任意操作
    pub async fn wrap<F, T>(&self, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        self.acquire().await;
        operation.await
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill);
        let added = self.capacity * elapsed.as_secs_f64() / self.interval.as_secs_f64();
        bucket.tokens = (bucket.tokens + added).min(self.capacity);
        bucket.last_refill = now;
    }
}
