use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, Map};
use tracing::debug;

use super::models::AppConfig;
use crate::errors::{AlertError, AlertResult};

/// 未指定配置文件时依次尝试的路径
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["config/alert-service.toml", "alert-service.toml"];

/// 约定的字符串类环境变量与配置键的映射
const STRING_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SMS_SENDER_ACCOUNT_SID", "sms.account_sid"),
    ("SMS_SENDER_AUTH_TOKEN", "sms.auth_token"),
    ("SMS_SENDER_NUMBER", "sms.sender_number"),
    ("PUSH_PROJECT_ID", "push.project_id"),
    ("PUSH_ACCESS_TOKEN", "push.access_token"),
    ("STORE_PROJECT_ID", "store.project_id"),
    ("STORE_ACCESS_TOKEN", "store.access_token"),
];

const INTEGER_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DISPATCH_CONCURRENCY_LIMIT", "dispatch.concurrency_limit"),
    ("DISPATCH_TIMEOUT_MS", "dispatch.timeout_ms"),
];

impl AppConfig {
    /// 从文件和进程环境加载配置
    ///
    /// 显式指定的文件必须存在；未指定时按 [`DEFAULT_CONFIG_PATHS`] 查找，找不到则只使用默认值和环境变量。
    pub fn load(config_path: Option<&str>) -> AlertResult<Self> {
        Self::load_with_env(config_path, None)
    }

    /// 与 [`AppConfig::load`] 相同，但可以用给定的变量表代替进程环境
    pub fn load_with_env(
        config_path: Option<&str>,
        env: Option<Map<String, String>>,
    ) -> AlertResult<Self> {
        let mut builder = Config::builder();

        match config_path {
            Some(path) => {
                if !Path::new(path).exists() {
                    return Err(AlertError::Configuration(format!(
                        "配置文件不存在: {path}"
                    )));
                }
                debug!("加载配置文件: {}", path);
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
            None => {
                if let Some(path) = DEFAULT_CONFIG_PATHS
                    .iter()
                    .find(|candidate| Path::new(candidate).exists())
                {
                    debug!("加载默认配置文件: {}", path);
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                }
            }
        }

        let lookup_env = env.clone();
        builder = builder.add_source(
            Environment::with_prefix("ALERT")
                .prefix_separator("_")
                .separator("__")
                .source(env),
        );
        builder = apply_env_overrides(builder, |key| match &lookup_env {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        })?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 字符串解析配置，不读取环境变量
    pub fn from_toml(content: &str) -> AlertResult<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

/// 把约定的环境变量作为最高优先级覆盖写入构建器
pub fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> AlertResult<ConfigBuilder<DefaultState>> {
    for (var, key) in STRING_ENV_OVERRIDES {
        if let Some(value) = lookup(var).filter(|value| !value.is_empty()) {
            builder = builder.set_override(*key, value)?;
        }
    }

    for (var, key) in INTEGER_ENV_OVERRIDES {
        if let Some(raw) = lookup(var).filter(|value| !value.is_empty()) {
            let value: i64 = raw.trim().parse().map_err(|_| {
                AlertError::Configuration(format!("环境变量 {var} 不是有效整数: {raw}"))
            })?;
            builder = builder.set_override(*key, value)?;
        }
    }

    Ok(builder)
}
