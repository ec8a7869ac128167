use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

use alert_core::errors::{AlertError, AlertResult, TransportError};

/// 构建带请求超时的 HTTP 客户端
pub(crate) fn build_client(timeout: Duration) -> AlertResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AlertError::Configuration(format!("创建HTTP客户端失败: {e}")))
}

/// 把请求层面的错误映射为传输错误
pub(crate) fn map_request_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::unknown(format!("请求失败: {err}"))
    }
}

/// 只支持秒数形式的 Retry-After
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// 截断响应体，避免把大段内容写进错误详情
pub(crate) fn excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    if body.chars().count() <= MAX_CHARS {
        body.to_string()
    } else {
        let truncated: String = body.chars().take(MAX_CHARS).collect();
        format!("{truncated}...")
    }
}
