use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;

use alert_dispatcher::AlertPipeline;

use crate::background::BackgroundRuns;
use crate::handlers::{
    alerts::{trigger_alert, trigger_alert_async},
    health::health_check,
    metrics::render_metrics,
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AlertPipeline>,
    pub background: BackgroundRuns,
    pub metrics: Option<PrometheusHandle>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        // 警报触发
        .route("/api/alerts", post(trigger_alert))
        .route("/api/alerts/async", post(trigger_alert_async))
        .with_state(state)
}
