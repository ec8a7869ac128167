use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use alert_core::{AlertAck, AlertError, AlertEvent, ResolverError};

use crate::{error::ApiResult, response::accepted, routes::AppState};

/// 同步触发：处理完成后返回脱敏的确认
///
/// 200 表示处理已完成，与各收件人是否送达无关；解析失败时返回失败确认，
/// 用户不存在为 404，用户数据存储不可用为 503。
pub async fn trigger_alert(
    State(state): State<AppState>,
    payload: Result<Json<AlertEvent>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(event) = payload?;

    let ack = state.pipeline.handle(event).await?;
    let status = ack_status(&ack);

    info!(
        "警报处理完成: alert_id={}, outcome={}, status={}",
        ack.report.alert_id,
        ack.report.outcome.as_str(),
        status.as_u16()
    );

    Ok((status, Json(ack.redacted())))
}

/// 异步触发：校验通过后立即返回 202，报告只发往观测汇
pub async fn trigger_alert_async(
    State(state): State<AppState>,
    payload: Result<Json<AlertEvent>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(event) = payload?;
    event.validate()?;

    let alert_id = event.alert_id.clone();
    let pipeline = state.pipeline.clone();

    info!("警报已受理，转入后台处理: alert_id={}", alert_id);

    state.background.spawn(async move {
        if let Err(e) = pipeline.handle(event).await {
            match e {
                AlertError::Duplicate { alert_id } => {
                    info!("后台处理跳过重复警报: alert_id={}", alert_id)
                }
                other => warn!("后台警报处理失败: {}", other),
            }
        }
    });

    Ok(accepted(
        json!({ "alertId": alert_id }),
        "警报已受理，正在后台处理",
    ))
}

fn ack_status(ack: &AlertAck) -> StatusCode {
    match &ack.report.resolver_failure {
        None => StatusCode::OK,
        Some(ResolverError::NotFound { .. }) => StatusCode::NOT_FOUND,
        Some(ResolverError::TransportUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
