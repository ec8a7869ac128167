use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use alert_core::AlertError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("警报处理错误: {0}")]
    Alert(#[from] AlertError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::Alert(AlertError::InvalidEvent(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("警报事件无效: {}", msg),
                "INVALID_EVENT".to_string(),
                vec![
                    "请确认 alertId 和 userId 均已提供且不为空".to_string(),
                    "attempt 从 1 开始计数".to_string(),
                ],
            ),
            ApiError::Alert(AlertError::Duplicate { alert_id }) => (
                StatusCode::CONFLICT,
                format!("警报 {} 为重复投递，已在分发前取消", alert_id),
                "DUPLICATE_ALERT".to_string(),
                vec![
                    "同一警报正在处理中或最近已全部送达".to_string(),
                    "需要重新通知时请使用新的 alertId".to_string(),
                ],
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {}", msg),
                "BAD_REQUEST".to_string(),
                vec![
                    "请检查JSON格式是否正确".to_string(),
                    "确保Content-Type设置为 application/json".to_string(),
                ],
            ),
            ApiError::Alert(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR".to_string(),
                vec![
                    "系统遇到内部错误，请稍后重试".to_string(),
                    "查看 GET /health 检查系统状态".to_string(),
                ],
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_error_conversion() {
        let api_error: ApiError = AlertError::Duplicate {
            alert_id: "a1".to_string(),
        }
        .into();

        match api_error {
            ApiError::Alert(AlertError::Duplicate { alert_id }) => assert_eq!(alert_id, "a1"),
            _ => panic!("Expected AlertError::Duplicate"),
        }
    }

    #[test]
    fn test_status_codes() {
        let invalid = ApiError::from(AlertError::InvalidEvent("userId 不能为空".to_string()));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let duplicate = ApiError::from(AlertError::Duplicate {
            alert_id: "a1".to_string(),
        });
        assert_eq!(duplicate.into_response().status(), StatusCode::CONFLICT);

        let bad = ApiError::BadRequest("缺少字段".to_string());
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let internal = ApiError::from(AlertError::Internal("boom".to_string()));
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::from(AlertError::Duplicate {
            alert_id: "a1".to_string(),
        })
        .into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "DUPLICATE_ALERT");
        assert_eq!(json["error"]["code"], 409);
        assert!(json["error"]["suggestions"].is_array());
    }
}
