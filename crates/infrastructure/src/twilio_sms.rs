use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use alert_core::config::SmsConfig;
use alert_core::errors::{AlertResult, TransportError};
use alert_core::traits::SmsTransport;

use crate::http::{build_client, excerpt, map_request_error, retry_after_secs};

/// Twilio 中表示目标号码无效或不可达的错误码
const INVALID_TARGET_CODES: &[u64] = &[21211, 21614, 21217];

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: Option<u64>,
    message: Option<String>,
}

/// Twilio 兼容的 REST 短信传输
pub struct TwilioSmsTransport {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
}

impl TwilioSmsTransport {
    pub fn new(config: &SmsConfig, timeout: Duration) -> AlertResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait]
impl SmsTransport for TwilioSmsTransport {
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let retry_after = retry_after_secs(response.headers());
        let text = response.text().await.map_err(map_request_error)?;

        if status.is_success() {
            let message: MessageResponse = serde_json::from_str(&text)
                .map_err(|e| TransportError::unknown(format!("无法解析短信响应: {e}")))?;
            debug!("Twilio 接受短信: sid={}", message.sid);
            return Ok(message.sid);
        }

        let error = match status {
            StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited {
                retry_after_secs: retry_after,
            },
            StatusCode::BAD_REQUEST => {
                let parsed: Option<ErrorResponse> = serde_json::from_str(&text).ok();
                match parsed {
                    Some(ErrorResponse {
                        code: Some(code),
                        message,
                    }) if INVALID_TARGET_CODES.contains(&code) => TransportError::invalid_target(
                        format!("Twilio {code}: {}", message.unwrap_or_default()),
                    ),
                    _ => TransportError::unknown(format!("HTTP 400: {}", excerpt(&text))),
                }
            }
            _ => TransportError::unknown(format!("HTTP {}: {}", status.as_u16(), excerpt(&text))),
        };

        warn!("Twilio 短信发送失败: status={}, error={}", status.as_u16(), error);
        Err(error)
    }

    fn name(&self) -> &str {
        "twilio"
    }
}
