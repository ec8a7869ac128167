use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use alert_core::config::RetryConfig;
use alert_core::errors::{ResolverError, TransportError};
use alert_core::models::{DispatchResult, RetryAdvice, RunOutcome};

/// 重试建议服务
///
/// 重投本身由上游触发机制负责，这里只给出是否值得重投、哪些任务值得重投以及最早重投时间。
#[derive(Debug, Clone, Default)]
pub struct RetryAdvisor {
    retry_config: RetryConfig,
}

impl RetryAdvisor {
    /// 创建新的重试建议服务
    pub fn new(retry_config: RetryConfig) -> Self {
        Self { retry_config }
    }

    /// 为已完成投递的运行生成重试建议
    pub fn advise(
        &self,
        outcome: RunOutcome,
        attempt: u32,
        results: &[DispatchResult],
    ) -> RetryAdvice {
        if !outcome.needs_retry() {
            return RetryAdvice::default();
        }

        let retryable_tasks: Vec<String> = results
            .iter()
            .filter(|result| {
                result
                    .transport_error()
                    .is_some_and(TransportError::is_retryable)
            })
            .map(|result| result.task_id.clone())
            .collect();

        // 只有被限流时才需要推迟重投
        let retry_after_hints: Vec<Option<u64>> = results
            .iter()
            .filter_map(|result| match result.transport_error() {
                Some(TransportError::RateLimited { retry_after_secs }) => Some(*retry_after_secs),
                _ => None,
            })
            .collect();

        let not_before = if retry_after_hints.is_empty() {
            None
        } else {
            let hinted = retry_after_hints.iter().flatten().max().copied().unwrap_or(0);
            let backoff = self.calculate_backoff(attempt);
            let delay = backoff.max(Duration::seconds(hinted as i64));
            Some(Utc::now() + delay)
        };

        debug!(
            "生成重试建议: outcome={}, retryable_tasks={}, not_before={:?}",
            outcome.as_str(),
            retryable_tasks.len(),
            not_before
        );

        RetryAdvice {
            eligible: true,
            retryable_tasks,
            not_before,
        }
    }

    /// 解析失败时没有任何任务，整个事件都可以重投；存储不可用时按退避推迟
    pub fn advise_resolver_failure(&self, error: &ResolverError, attempt: u32) -> RetryAdvice {
        let not_before = error
            .is_transient()
            .then(|| self.calculate_next_retry_time(attempt));

        RetryAdvice {
            eligible: true,
            retryable_tasks: Vec::new(),
            not_before,
        }
    }

    /// 计算第 `attempt` 次投递失败后的退避间隔
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let base_interval = self.retry_config.base_interval_seconds as f64;
        let multiplier = self.retry_config.backoff_multiplier;
        let max_interval = self.retry_config.max_interval_seconds as f64;
        let jitter_factor = self.retry_config.jitter_factor;

        // 计算指数退避间隔
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let exponential_interval = base_interval * multiplier.powi(exponent);

        // 限制最大间隔
        let capped_interval = exponential_interval.min(max_interval);

        // 添加随机抖动以避免雷群效应
        let jitter = capped_interval * jitter_factor * (rand::random::<f64>() - 0.5) * 2.0;
        let final_interval = (capped_interval + jitter).max(base_interval);

        Duration::seconds(final_interval as i64)
    }

    /// 计算下次重投时间
    pub fn calculate_next_retry_time(&self, attempt: u32) -> DateTime<Utc> {
        Utc::now() + self.calculate_backoff(attempt)
    }
}
