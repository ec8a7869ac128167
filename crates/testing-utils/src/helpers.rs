//! 测试辅助工具与常用数据

use std::time::Duration;

use tokio::time::sleep;

use crate::builders::{profile, ContactBuilder, DeviceBuilder};
use crate::mocks::MockUserDataStore;

/// 测试环境辅助工具
pub struct TestEnv;

impl TestEnv {
    /// 在超时时间内等待条件成立
    ///
    /// 被测逻辑在后台任务中运行时使用。
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(20)).await;
        }

        false
    }
}

/// 预置的收件人数据
pub struct Fixtures;

impl Fixtures {
    /// 用户 `U1`（"Ann"），含一个仅有手机号的联系人、一个仅有邮箱的联系人和一台设备
    pub fn mixed_channel_store() -> MockUserDataStore {
        MockUserDataStore::new()
            .with_user(profile("U1", Some("Ann")))
            .with_contact(
                "U1",
                ContactBuilder::new("c1").with_phone("+15551112222").build(),
            )
            .with_contact("U1", ContactBuilder::new("c2").with_email("a@b.com").build())
            .with_device("U1", DeviceBuilder::new("d1").with_token("tok1").build())
    }

    /// 含 `contacts` 个同时有手机号和邮箱的联系人，以及 `devices` 台带令牌设备的用户
    pub fn full_channel_store(user_id: &str, contacts: usize, devices: usize) -> MockUserDataStore {
        let mut store = MockUserDataStore::new().with_user(profile(user_id, Some("Test User")));
        for i in 0..contacts {
            store = store.with_contact(
                user_id,
                ContactBuilder::new(&format!("c{i}"))
                    .with_phone(&format!("+1555000{:04}", i))
                    .with_email(&format!("contact{i}@example.com"))
                    .build(),
            );
        }
        for i in 0..devices {
            store = store.with_device(
                user_id,
                DeviceBuilder::new(&format!("d{i}"))
                    .with_token(&format!("token-{i}"))
                    .build(),
            );
        }
        store
    }
}
