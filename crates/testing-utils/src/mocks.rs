//! 外部依赖的内存测试替身
//!
//! 每个 mock 克隆后共享同一份状态，测试可以把一份交给管线，再用另一份检查结果。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use alert_core::errors::{SinkError, StoreError, StoreResult, TransportError};
use alert_core::models::{Contact, Device, FanOutReport, UserProfile};
use alert_core::traits::{PushTransport, ReportSink, SmsTransport, UserDataStore};

/// 注入失败的收件人解析读取类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreRead {
    Profile,
    Contacts,
    Devices,
}

/// 测试用的 UserDataStore 模拟实现
#[derive(Debug, Clone, Default)]
pub struct MockUserDataStore {
    profiles: Arc<Mutex<HashMap<String, UserProfile>>>,
    contacts: Arc<Mutex<HashMap<String, Vec<Contact>>>>,
    devices: Arc<Mutex<HashMap<String, Vec<Device>>>>,
    failures: Arc<Mutex<HashMap<StoreRead, StoreError>>>,
    reads: Arc<AtomicUsize>,
}

impl MockUserDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, profile: UserProfile) -> Self {
        self.insert_profile(profile);
        self
    }

    pub fn with_contact(self, user_id: &str, contact: Contact) -> Self {
        self.contacts
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .push(contact);
        self
    }

    pub fn with_device(self, user_id: &str, device: Device) -> Self {
        self.devices
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .push(device);
        self
    }

    pub fn insert_profile(&self, profile: UserProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile);
    }

    /// 之后每次 `read` 读取都返回 `error`
    pub fn fail_on(&self, read: StoreRead, error: StoreError) {
        self.failures.lock().unwrap().insert(read, error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// 已处理的读取总数，包含失败的读取
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self, read: StoreRead) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().unwrap().get(&read) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserDataStore for MockUserDataStore {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        self.check(StoreRead::Profile)?;
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn list_contacts(&self, user_id: &str) -> StoreResult<Vec<Contact>> {
        self.check(StoreRead::Contacts)?;
        Ok(self
            .contacts
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_devices(&self, user_id: &str) -> StoreResult<Vec<Device>> {
        self.check(StoreRead::Devices)?;
        Ok(self
            .devices
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// 模拟通道对某个投递目标的预设行为
#[derive(Debug, Clone)]
pub enum ScriptedBehavior {
    Succeed,
    /// 延迟后成功，用于观察并发度
    Delay(Duration),
    Fail(TransportError),
    /// 永不完成，只能靠超时返回
    Hang,
    Panic,
}

/// 按目标共享的行为脚本与在途计数
#[derive(Debug, Clone)]
struct Script {
    behaviors: Arc<Mutex<HashMap<String, ScriptedBehavior>>>,
    default: Arc<Mutex<ScriptedBehavior>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            behaviors: Arc::new(Mutex::new(HashMap::new())),
            default: Arc::new(Mutex::new(ScriptedBehavior::Succeed)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Script {
    fn set(&self, target: &str, behavior: ScriptedBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(target.to_string(), behavior);
    }

    fn set_default(&self, behavior: ScriptedBehavior) {
        *self.default.lock().unwrap() = behavior;
    }

    async fn run(&self, target: &str) -> Result<usize, TransportError> {
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .unwrap_or_else(|| self.default.lock().unwrap().clone());

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        match behavior {
            ScriptedBehavior::Succeed => Ok(call),
            ScriptedBehavior::Delay(duration) => {
                tokio::time::sleep(duration).await;
                Ok(call)
            }
            ScriptedBehavior::Fail(error) => Err(error),
            ScriptedBehavior::Hang => {
                std::future::pending::<()>().await;
                Err(TransportError::Timeout)
            }
            ScriptedBehavior::Panic => panic!("模拟通道预设 panic: {target}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
    pub from: String,
    pub to: String,
    pub body: String,
}

/// 测试用的 SmsTransport 模拟实现，按目标号码设定行为
#[derive(Debug, Clone, Default)]
pub struct MockSmsTransport {
    script: Script,
    sent: Arc<Mutex<Vec<SentSms>>>,
}

impl MockSmsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, to: &str, behavior: ScriptedBehavior) {
        self.script.set(to, behavior);
    }

    pub fn script_default(&self, behavior: ScriptedBehavior) {
        self.script.set_default(behavior);
    }

    /// 通道已接受的消息
    pub fn sent(&self) -> Vec<SentSms> {
        self.sent.lock().unwrap().clone()
    }

    /// 全部发送调用次数，包含失败和挂起的调用
    pub fn call_count(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.script.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsTransport for MockSmsTransport {
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<String, TransportError> {
        let call = self.script.run(to).await?;
        self.sent.lock().unwrap().push(SentSms {
            from: from.to_string(),
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(format!("SM{call:04}"))
    }

    fn name(&self) -> &str {
        "mock-sms"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPush {
    pub token: String,
    pub title: String,
    pub body: String,
}

/// 测试用的 PushTransport 模拟实现，按设备令牌设定行为
#[derive(Debug, Clone, Default)]
pub struct MockPushTransport {
    script: Script,
    sent: Arc<Mutex<Vec<SentPush>>>,
}

impl MockPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, token: &str, behavior: ScriptedBehavior) {
        self.script.set(token, behavior);
    }

    pub fn script_default(&self, behavior: ScriptedBehavior) {
        self.script.set_default(behavior);
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.script.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushTransport for MockPushTransport {
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<String, TransportError> {
        let call = self.script.run(token).await?;
        self.sent.lock().unwrap().push(SentPush {
            token: token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(format!("projects/test/messages/{call}"))
    }

    fn name(&self) -> &str {
        "mock-push"
    }
}

/// 保存所有已发布报告的 ReportSink
#[derive(Debug, Clone, Default)]
pub struct RecordingReportSink {
    reports: Arc<Mutex<Vec<FanOutReport>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录报告后总是返回失败的 sink
    pub fn failing() -> Self {
        let sink = Self::default();
        *sink.failing.lock().unwrap() = true;
        sink
    }

    pub fn reports(&self) -> Vec<FanOutReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<FanOutReport> {
        self.reports.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

#[async_trait]
impl ReportSink for RecordingReportSink {
    async fn publish(&self, report: &FanOutReport) -> Result<(), SinkError> {
        self.reports.lock().unwrap().push(report.clone());
        if *self.failing.lock().unwrap() {
            return Err(SinkError("记录型 sink 被配置为发布失败".to_string()));
        }
        Ok(())
    }
}
