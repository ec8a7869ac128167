use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use alert_core::models::RunOutcome;

#[derive(Debug, Clone, Copy)]
enum GuardEntry {
    InFlight,
    Completed {
        at: DateTime<Utc>,
        outcome: RunOutcome,
    },
}

/// 重复投递的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    /// 同一警报正在处理中
    InFlight,
    /// 同一警报在去重窗口内已全部成功
    RecentlySucceeded { completed_at: DateTime<Utc> },
}

/// 按 alertId 的重复投递保护
///
/// 只在投递开始前生效，已经在途的投递任务不会被取消。需要重试的运行和超出窗口的运行允许完整重跑。
#[derive(Debug, Clone)]
pub struct DuplicateGuard {
    window: chrono::Duration,
    entries: Arc<Mutex<HashMap<String, GuardEntry>>>,
}

impl DuplicateGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window: chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 尝试占用 `alert_id`，成功时返回在途许可
    pub fn try_acquire(&self, alert_id: &str) -> Result<GuardPermit, DuplicateKind> {
        let now = Utc::now();
        let mut entries = lock(&self.entries);

        let window = self.window;
        entries.retain(|_, entry| match entry {
            GuardEntry::InFlight => true,
            GuardEntry::Completed { at, .. } => now - *at < window,
        });

        match entries.get(alert_id) {
            Some(GuardEntry::InFlight) => return Err(DuplicateKind::InFlight),
            Some(GuardEntry::Completed { at, outcome }) if !outcome.needs_retry() => {
                return Err(DuplicateKind::RecentlySucceeded { completed_at: *at });
            }
            _ => {}
        }

        entries.insert(alert_id.to_string(), GuardEntry::InFlight);
        debug!("占用警报去重许可: alert_id={}", alert_id);

        Ok(GuardPermit {
            alert_id: alert_id.to_string(),
            entries: self.entries.clone(),
            completed: false,
        })
    }

    pub fn tracked(&self) -> usize {
        lock(&self.entries).len()
    }
}

/// 在途许可：`complete` 记录运行结果；未完成就被丢弃时释放占用，允许上游重投
#[derive(Debug)]
pub struct GuardPermit {
    alert_id: String,
    entries: Arc<Mutex<HashMap<String, GuardEntry>>>,
    completed: bool,
}

impl GuardPermit {
    pub fn complete(mut self, outcome: RunOutcome) {
        lock(&self.entries).insert(
            self.alert_id.clone(),
            GuardEntry::Completed {
                at: Utc::now(),
                outcome,
            },
        );
        self.completed = true;
    }
}

impl Drop for GuardPermit {
    fn drop(&mut self) {
        if !self.completed {
            let mut entries = lock(&self.entries);
            if matches!(entries.get(&self.alert_id), Some(GuardEntry::InFlight)) {
                entries.remove(&self.alert_id);
            }
        }
    }
}

fn lock(entries: &Mutex<HashMap<String, GuardEntry>>) -> MutexGuard<'_, HashMap<String, GuardEntry>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_is_duplicate() {
        let guard = DuplicateGuard::new(Duration::from_secs(600));
        let permit = guard.try_acquire("a1").unwrap();
        assert_eq!(guard.try_acquire("a1").unwrap_err(), DuplicateKind::InFlight);
        assert!(guard.try_acquire("a2").is_ok());
        drop(permit);
    }

    #[test]
    fn test_success_within_window_is_duplicate() {
        let guard = DuplicateGuard::new(Duration::from_secs(600));
        guard
            .try_acquire("a1")
            .unwrap()
            .complete(RunOutcome::FullySucceeded);
        assert!(matches!(
            guard.try_acquire("a1"),
            Err(DuplicateKind::RecentlySucceeded { .. })
        ));
    }

    #[test]
    fn test_failed_run_may_be_retried() {
        let guard = DuplicateGuard::new(Duration::from_secs(600));
        guard
            .try_acquire("a1")
            .unwrap()
            .complete(RunOutcome::PartiallyFailed);
        assert!(guard.try_acquire("a1").is_ok());
    }

    #[test]
    fn test_dropped_permit_releases() {
        let guard = DuplicateGuard::new(Duration::from_secs(600));
        drop(guard.try_acquire("a1").unwrap());
        assert_eq!(guard.tracked(), 0);
        assert!(guard.try_acquire("a1").is_ok());
    }

    #[test]
    fn test_zero_window_only_guards_in_flight() {
        let guard = DuplicateGuard::new(Duration::ZERO);
        guard
            .try_acquire("a1")
            .unwrap()
            .complete(RunOutcome::FullySucceeded);
        assert!(guard.try_acquire("a1").is_ok());
    }
}
