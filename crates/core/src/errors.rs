use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 警报系统错误类型定义
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("收件人解析失败: {0}")]
    Resolver(#[from] ResolverError),

    #[error("无效的警报事件: {0}")]
    InvalidEvent(String),

    #[error("重复的警报事件: {alert_id}")]
    Duplicate { alert_id: String },

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("配置加载错误: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 收件人解析错误，对整次运行是致命的
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolverError {
    #[error("用户未找到: {user_id}")]
    NotFound { user_id: String },

    #[error("用户数据存储不可用: {detail}")]
    TransportUnavailable { detail: String },
}

impl ResolverError {
    /// 存储暂时不可用，退避后重投更可能成功
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolverError::TransportUnavailable { .. })
    }

    /// 去掉内部细节，用于返回给触发方
    pub fn redacted(&self) -> Self {
        match self {
            ResolverError::NotFound { user_id } => ResolverError::NotFound {
                user_id: user_id.clone(),
            },
            ResolverError::TransportUnavailable { .. } => ResolverError::TransportUnavailable {
                detail: String::new(),
            },
        }
    }
}

impl From<StoreError> for ResolverError {
    fn from(err: StoreError) -> Self {
        ResolverError::TransportUnavailable {
            detail: err.to_string(),
        }
    }
}

/// 单个收件人的传输错误，只记录在结果中，不会中止其他任务
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportError {
    #[error("发送超时")]
    Timeout,

    #[error("被传输方限流")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("无效的投递目标: {detail}")]
    InvalidTarget { detail: String },

    #[error("未知传输错误: {detail}")]
    Unknown { detail: String },
}

impl TransportError {
    pub fn invalid_target(detail: impl Into<String>) -> Self {
        TransportError::InvalidTarget {
            detail: detail.into(),
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        TransportError::Unknown {
            detail: detail.into(),
        }
    }

    /// InvalidTarget 重试也不可能成功
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::InvalidTarget { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout => "timeout",
            TransportError::RateLimited { .. } => "rate_limited",
            TransportError::InvalidTarget { .. } => "invalid_target",
            TransportError::Unknown { .. } => "unknown",
        }
    }

    pub fn redacted(&self) -> Self {
        match self {
            TransportError::Timeout => TransportError::Timeout,
            TransportError::RateLimited { retry_after_secs } => TransportError::RateLimited {
                retry_after_secs: *retry_after_secs,
            },
            TransportError::InvalidTarget { .. } => TransportError::invalid_target(""),
            TransportError::Unknown { .. } => TransportError::unknown(""),
        }
    }
}

/// 用户数据存储错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("存储不可用: {0}")]
    Unavailable(String),

    #[error("文档解码失败: {0}")]
    Decode(String),
}

/// 观测接收端错误，永远不会让整次运行失败
#[derive(Debug, Clone, Error)]
#[error("报告发布失败: {0}")]
pub struct SinkError(pub String);

/// 统一的Result类型
pub type AlertResult<T> = std::result::Result<T, AlertError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;
