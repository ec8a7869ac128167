use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{info, warn};

use alert_api::{background::BackgroundRuns, create_app};
use alert_core::config::{AppConfig, StoreBackend};
use alert_core::traits::{PushTransport, ReportSink, SmsTransport, UserDataStore};
use alert_dispatcher::AlertPipeline;
use alert_infrastructure::{
    FcmPushTransport, FirestoreUserDataStore, InMemoryUserDataStore, ObservabilityReportSink,
    TwilioSmsTransport,
};

/// 关闭时等待后台警报处理的最长时间
const BACKGROUND_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// 组装完成、可以对外服务的应用
pub struct Application {
    config: AppConfig,
    pipeline: Arc<AlertPipeline>,
    background: BackgroundRuns,
    metrics: Option<PrometheusHandle>,
}

impl Application {
    /// 按配置创建外部适配器并组装管道
    pub fn new(config: AppConfig, metrics: Option<PrometheusHandle>) -> Result<Self> {
        let timeout = config.dispatch.timeout();

        let store: Arc<dyn UserDataStore> = match config.store.backend {
            StoreBackend::Firestore => {
                info!("使用Firestore用户数据存储: project_id={}", config.store.project_id);
                Arc::new(
                    FirestoreUserDataStore::new(&config.store, timeout)
                        .context("创建Firestore用户数据存储失败")?,
                )
            }
            StoreBackend::Memory => match &config.store.seed_path {
                Some(path) => {
                    let store = InMemoryUserDataStore::from_seed_file(path)
                        .with_context(|| format!("加载用户种子数据失败: {path}"))?;
                    info!("使用内存用户数据存储，种子文件: {}", path);
                    Arc::new(store)
                }
                None => {
                    warn!("使用空的内存用户数据存储，所有警报都会因用户不存在而失败");
                    Arc::new(InMemoryUserDataStore::new())
                }
            },
        };

        let sms: Arc<dyn SmsTransport> = Arc::new(
            TwilioSmsTransport::new(&config.sms, timeout).context("创建短信传输失败")?,
        );
        let push: Arc<dyn PushTransport> = Arc::new(
            FcmPushTransport::new(&config.push, timeout).context("创建推送传输失败")?,
        );
        let sink: Arc<dyn ReportSink> = Arc::new(ObservabilityReportSink::new(
            config.observability.metrics_enabled,
        ));

        Ok(Self::with_components(config, store, sms, push, sink, metrics))
    }

    /// 使用给定的协作者组装应用
    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn UserDataStore>,
        sms: Arc<dyn SmsTransport>,
        push: Arc<dyn PushTransport>,
        sink: Arc<dyn ReportSink>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let pipeline = AlertPipeline::from_config(&config, store, sms, push, sink);

        Self {
            config,
            pipeline: Arc::new(pipeline),
            background: BackgroundRuns::new(),
            metrics,
        }
    }

    pub fn router(&self) -> Router {
        create_app(
            self.pipeline.clone(),
            self.background.clone(),
            self.metrics.clone(),
        )
    }

    /// 绑定配置中的地址并运行到收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let bind_address = &self.config.server.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;

        self.serve(listener, shutdown_rx).await
    }

    /// 在已绑定的监听器上提供服务
    ///
    /// 收到关闭信号后停止接收新请求，等待在途请求结束，再等待后台警报处理结束。
    /// 已经发出的通知不会被中途取消。
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let local_addr = listener.local_addr().context("读取监听地址失败")?;
        info!("警报服务启动在 http://{}", local_addr);

        axum::serve(listener, self.router().into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP服务收到关闭信号，停止接收新请求");
            })
            .await
            .context("HTTP服务运行失败")?;

        let pending = self.background.in_flight();
        if pending > 0 {
            info!("等待 {} 个后台警报处理完成", pending);
        }
        self.background.wait_idle(BACKGROUND_DRAIN_TIMEOUT).await;

        info!("警报服务已停止");
        Ok(())
    }
}
