use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{AlertError, AlertResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dispatch: DispatchConfig,
    pub sms: SmsConfig,
    pub push: PushConfig,
    pub store: StoreConfig,
    pub observability: ObservabilityConfig,
    pub dedup: DedupConfig,
    pub retry: RetryConfig,
}

impl AppConfig {
    pub fn validate(&self) -> AlertResult<()> {
        self.server.validate()?;
        self.dispatch.validate()?;
        self.sms.validate()?;
        self.push.validate()?;
        self.store.validate()?;
        self.observability.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> AlertResult<()> {
        if self.bind_address.trim().is_empty() {
            return Err(config_error("监听地址不能为空"));
        }
        Ok(())
    }
}

/// 扇出执行参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// 同时在途的投递任务上限
    pub concurrency_limit: usize,
    /// 单次投递尝试超时（毫秒）
    pub timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 20,
            timeout_ms: 10_000,
        }
    }
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> AlertResult<()> {
        if self.concurrency_limit == 0 {
            return Err(config_error("最大并发投递数必须大于0"));
        }
        if self.timeout_ms == 0 {
            return Err(config_error("投递超时时间必须大于0"));
        }
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub sender_number: String,
    pub api_base_url: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            sender_number: String::new(),
            api_base_url: "https://api.twilio.com".to_string(),
        }
    }
}

impl fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &redact(&self.auth_token))
            .field("sender_number", &self.sender_number)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl SmsConfig {
    pub fn validate(&self) -> AlertResult<()> {
        if self.account_sid.is_empty() {
            return Err(config_error("缺少短信账号SID (SMS_SENDER_ACCOUNT_SID)"));
        }
        if self.auth_token.is_empty() {
            return Err(config_error("缺少短信认证令牌 (SMS_SENDER_AUTH_TOKEN)"));
        }
        if self.sender_number.is_empty() {
            return Err(config_error("缺少短信发送号码 (SMS_SENDER_NUMBER)"));
        }
        if self.api_base_url.is_empty() {
            return Err(config_error("短信API地址不能为空"));
        }
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub project_id: String,
    pub access_token: String,
    pub api_base_url: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            access_token: String::new(),
            api_base_url: "https://fcm.googleapis.com".to_string(),
        }
    }
}

impl fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushConfig")
            .field("project_id", &self.project_id)
            .field("access_token", &redact(&self.access_token))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl PushConfig {
    pub fn validate(&self) -> AlertResult<()> {
        if self.project_id.is_empty() {
            return Err(config_error("缺少推送项目ID (PUSH_PROJECT_ID)"));
        }
        if self.access_token.is_empty() {
            return Err(config_error("缺少推送访问令牌 (PUSH_ACCESS_TOKEN)"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Firestore,
    Memory,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub project_id: String,
    pub access_token: String,
    pub api_base_url: String,
    /// memory 后端的JSON种子文件
    pub seed_path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Firestore,
            project_id: String::new(),
            access_token: String::new(),
            api_base_url: "https://firestore.googleapis.com".to_string(),
            seed_path: None,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("project_id", &self.project_id)
            .field("access_token", &redact(&self.access_token))
            .field("api_base_url", &self.api_base_url)
            .field("seed_path", &self.seed_path)
            .finish()
    }
}

impl StoreConfig {
    pub fn validate(&self) -> AlertResult<()> {
        if self.backend == StoreBackend::Firestore {
            if self.project_id.is_empty() {
                return Err(config_error("firestore 后端缺少项目ID (STORE_PROJECT_ID)"));
            }
            if self.access_token.is_empty() {
                return Err(config_error("firestore 后端缺少访问令牌 (STORE_ACCESS_TOKEN)"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ObservabilityConfig {
    pub fn validate(&self) -> AlertResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(config_error(&format!(
                "无效的日志级别: {}，支持的级别: {:?}",
                self.log_level, valid_levels
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// 成功处理过的警报在该窗口内再次投递视为重复
    pub window_seconds: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_seconds: 600,
        }
    }
}

impl DedupConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// 重试建议使用的退避参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 基础重试间隔（秒）
    pub base_interval_seconds: u64,
    /// 最大重试间隔（秒）
    pub max_interval_seconds: u64,
    /// 指数退避倍数
    pub backoff_multiplier: f64,
    /// 重试间隔的随机抖动范围（0.0-1.0）
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_interval_seconds: 30,
            max_interval_seconds: 900,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> AlertResult<()> {
        if self.base_interval_seconds == 0 {
            return Err(config_error("基础重试间隔必须大于0"));
        }
        if self.max_interval_seconds < self.base_interval_seconds {
            return Err(config_error("最大重试间隔不能小于基础重试间隔"));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(config_error("退避倍数不能小于1.0"));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(config_error("抖动系数必须在0.0到1.0之间"));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> AlertError {
    AlertError::Configuration(message.to_string())
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "***"
    }
}
