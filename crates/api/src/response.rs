use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 异步触发的受理回执
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    fn with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// 已受理、后台处理中：202 加上受理回执
pub fn accepted<T: Serialize>(data: T, message: &str) -> impl IntoResponse {
    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::with_message(data, message)),
    )
}
