//! # Alert API
//!
//! 紧急警报扇出服务的HTTP触发接口，基于Axum构建。
//!
//! ## API 端点
//!
//! - `POST /api/alerts` - 处理一个警报事件，处理完成后返回确认 `{ success, report }`
//! - `POST /api/alerts/async` - 校验后立即返回 202，在后台处理
//! - `GET /health` - 存活检查
//! - `GET /metrics` - Prometheus 指标
//!
//! ## 状态码
//!
//! | 情况 | 状态码 |
//! |------|--------|
//! | 处理完成（无论各收件人结果如何） | 200 |
//! | 用户不存在 | 404 |
//! | 用户数据存储不可用 | 503 |
//! | 重复投递 | 409 |
//! | 请求体无效 | 400 |
//!
//! 返回给触发方的报告经过脱敏，不包含逐个收件人的传输细节。

pub mod background;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;

use alert_dispatcher::AlertPipeline;
use background::BackgroundRuns;
use middleware::{cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(
    pipeline: Arc<AlertPipeline>,
    background: BackgroundRuns,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let state = AppState {
        pipeline,
        background,
        metrics,
    };

    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
