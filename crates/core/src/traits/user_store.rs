use async_trait::async_trait;

use crate::errors::StoreResult;
use crate::models::{Contact, Device, UserProfile};

/// 外部用户数据存储的只读接口
#[async_trait]
pub trait UserDataStore: Send + Sync {
    /// 用户不存在时返回 `Ok(None)`
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    /// 按存储顺序返回全部紧急联系人
    async fn list_contacts(&self, user_id: &str) -> StoreResult<Vec<Contact>>;

    /// 按存储顺序返回全部已注册设备
    async fn list_devices(&self, user_id: &str) -> StoreResult<Vec<Device>>;
}
