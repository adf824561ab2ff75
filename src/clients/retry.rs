//! 重试策略
//!
//! 只重试 5xx 和网络错误；4xx 表示请求本身有问题，重试也不会成功，立即返回。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;
use crate::error::TransportError;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（包括第一次）
    pub max_retries: u32,
    /// 基础间隔，第 n 次失败后等待 `delay * n`
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay * attempt
    }

    /// 执行操作，失败时按策略重试
    ///
    /// 等待期间如果 `cancel` 被触发，立即返回 `TransportError::Cancelled`。
    /// 超过次数后返回最后一次的错误。
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let attempts = self.max_retries.max(1);
        let mut attempt = 1;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= attempts {
                return Err(err);
            }

            let wait = self.backoff(attempt);
            warn!(
                "请求失败 (尝试 {}/{}): {}, {}ms 后重试...",
                attempt,
                attempts,
                err,
                wait.as_millis()
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                _ = sleep(wait) => {}
            }

            attempt += 1;
        }
    }
}
