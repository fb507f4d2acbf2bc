//! 有界并发工作池
//!
//! 固定数量的工作任务从同一个共享队列中逐个取任务，完成的结果通过通道
//! 发送给唯一的汇总方（调用者），结果集合只由汇总方持有。

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::error;
use tokio::sync::mpsc;

/// 一次工作池运行的结果
#[derive(Debug)]
pub struct PoolRun<T, R> {
    /// 已完成的结果，顺序不保证
    pub completed: Vec<R>,
    /// 因停止信号而未被处理的任务
    pub skipped: Vec<T>,
}

/// 工作池
#[derive(Debug, Clone)]
pub struct WorkerPool {
    threads: usize,
    running: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(threads: usize, running: Arc<AtomicBool>) -> Self {
        WorkerPool {
            threads: threads.max(1),
            running,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// 并发处理所有任务
    ///
    /// `work` 自身必须吸收错误，返回每个任务的最终结果。
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, work: F) -> PoolRun<T, R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        if items.is_empty() {
            return PoolRun {
                completed: Vec::new(),
                skipped: Vec::new(),
            };
        }

        let total = items.len();
        let workers = self.threads.min(total);
        let queue: Arc<Mutex<VecDeque<T>>> = Arc::new(Mutex::new(items.into()));
        let work = Arc::new(work);
        let (result_send, mut result_recv) = mpsc::channel::<R>(workers * 2);

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let work = Arc::clone(&work);
            let result_send = result_send.clone();
            let running = Arc::clone(&self.running);

            handles.push(tokio::spawn(async move {
                while running.load(Ordering::Relaxed) {
                    let next = match queue.lock() {
                        Ok(mut queue) => queue.pop_front(),
                        Err(poisoned) => poisoned.into_inner().pop_front(),
                    };
                    let Some(item) = next else { break };

                    let result = work(item).await;
                    if result_send.send(result).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(result_send);

        let mut completed = Vec::with_capacity(total);
        while let Some(result) = result_recv.recv().await {
            completed.push(result);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("工作任务异常退出: {}", e);
            }
        }

        let skipped: Vec<T> = match queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };

        PoolRun { completed, skipped }
    }
}
