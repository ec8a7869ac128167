//! 服务配置
//!
//! 配置来源按优先级从低到高：
//!
//! 1. 结构体默认值
//! 2. TOML 配置文件（可选）
//! 3. `ALERT_` 前缀的环境变量，层级用 `__` 分隔，例如 `ALERT_DISPATCH__CONCURRENCY_LIMIT`
//! 4. 约定的环境变量：`SMS_SENDER_ACCOUNT_SID`、`SMS_SENDER_AUTH_TOKEN`、`SMS_SENDER_NUMBER`、
//!    `DISPATCH_CONCURRENCY_LIMIT`、`DISPATCH_TIMEOUT_MS`、`PUSH_PROJECT_ID`、`PUSH_ACCESS_TOKEN`、
//!    `STORE_PROJECT_ID`、`STORE_ACCESS_TOKEN`
//!
//! 凭据只通过环境或密钥配置提供，不写死在代码中。

pub mod loader;
pub mod models;

pub use models::*;
