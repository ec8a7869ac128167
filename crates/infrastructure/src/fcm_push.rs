use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use alert_core::config::PushConfig;
use alert_core::errors::{AlertResult, TransportError};
use alert_core::traits::PushTransport;

use crate::http::{build_client, excerpt, map_request_error, retry_after_secs};

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

/// FCM v1 兼容的 REST 推送传输
pub struct FcmPushTransport {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: String,
}

impl FcmPushTransport {
    pub fn new(config: &PushConfig, timeout: Duration) -> AlertResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.base_url, self.project_id
        )
    }
}

/// 令牌失效或参数非法时重试没有意义
fn is_invalid_token(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    let error = &value["error"];
    if error["status"] == "INVALID_ARGUMENT" || error["status"] == "NOT_FOUND" {
        return true;
    }
    error["details"]
        .as_array()
        .map(|details| {
            details.iter().any(|detail| {
                matches!(
                    detail["errorCode"].as_str(),
                    Some("UNREGISTERED") | Some("INVALID_ARGUMENT")
                )
            })
        })
        .unwrap_or(false)
}

#[async_trait]
impl PushTransport for FcmPushTransport {
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<String, TransportError> {
        let payload = json!({
            "message": {
                "token": token,
                "notification": {
                    "title": title,
                    "body": body,
                }
            }
        });

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let retry_after = retry_after_secs(response.headers());
        let text = response.text().await.map_err(map_request_error)?;

        if status.is_success() {
            let sent: SendResponse = serde_json::from_str(&text)
                .map_err(|e| TransportError::unknown(format!("无法解析推送响应: {e}")))?;
            debug!("FCM 接受推送: name={}", sent.name);
            return Ok(sent.name);
        }

        let error = match status {
            StatusCode::NOT_FOUND => TransportError::invalid_target("设备令牌未注册"),
            StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited {
                retry_after_secs: retry_after,
            },
            _ if is_invalid_token(&text) => {
                TransportError::invalid_target(format!("HTTP {}: {}", status.as_u16(), excerpt(&text)))
            }
            _ => TransportError::unknown(format!("HTTP {}: {}", status.as_u16(), excerpt(&text))),
        };

        warn!("FCM 推送发送失败: status={}, error={}", status.as_u16(), error);
        Err(error)
    }

    fn name(&self) -> &str {
        "fcm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_invalid_token() {
        assert!(is_invalid_token(
            r#"{"error":{"code":400,"status":"INVALID_ARGUMENT","message":"bad token"}}"#
        ));
        assert!(is_invalid_token(
            r#"{"error":{"code":400,"status":"FAILED_PRECONDITION","details":[{"errorCode":"UNREGISTERED"}]}}"#
        ));
        assert!(!is_invalid_token(
            r#"{"error":{"code":500,"status":"INTERNAL"}}"#
        ));
        assert!(!is_invalid_token("<html>bad gateway</html>"));
    }
}
