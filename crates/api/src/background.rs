use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{info, warn};

/// 后台警报处理的计数器，关闭时用来等待在途运行结束
#[derive(Debug, Clone, Default)]
pub struct BackgroundRuns {
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

struct RunGuard {
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl BackgroundRuns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = RunGuard {
            in_flight: self.in_flight.clone(),
            idle: self.idle.clone(),
        };
        tokio::spawn(async move {
            let _guard = guard;
            future.await;
        });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 等待全部后台运行结束，超时返回 false
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.idle.notified();
                if self.in_flight() == 0 {
                    return;
                }
                notified.await;
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(()) => {
                info!("后台警报处理已全部完成");
                true
            }
            Err(_) => {
                warn!("等待后台警报处理超时，仍有 {} 个运行未完成", self.in_flight());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_idle() {
        let runs = BackgroundRuns::new();
        assert!(runs.wait_idle(Duration::from_millis(10)).await);

        runs.spawn(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        });
        assert_eq!(runs.in_flight(), 1);
        assert!(runs.wait_idle(Duration::from_secs(2)).await);
        assert_eq!(runs.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_timeout() {
        let runs = BackgroundRuns::new();
        runs.spawn(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        assert!(!runs.wait_idle(Duration::from_millis(20)).await);
    }
}
