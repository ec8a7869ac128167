use std::sync::Arc;

use tracing::{debug, warn};

use alert_core::errors::ResolverError;
use alert_core::models::RecipientSet;
use alert_core::traits::UserDataStore;

/// 收件人解析器：读取用户资料、紧急联系人和设备列表
///
/// 三次读取必须全部成功才返回；任何一次失败都视为整体解析失败，
/// 不在不完整的数据上投递。解析器内部不做重试。
pub struct RecipientResolver {
    store: Arc<dyn UserDataStore>,
}

impl RecipientResolver {
    pub fn new(store: Arc<dyn UserDataStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, user_id: &str) -> Result<RecipientSet, ResolverError> {
        let profile = self
            .store
            .get_profile(user_id)
            .await
            .map_err(|e| {
                warn!("读取用户资料失败: user_id={}, error={}", user_id, e);
                ResolverError::from(e)
            })?
            .ok_or_else(|| ResolverError::NotFound {
                user_id: user_id.to_string(),
            })?;

        let (contacts, devices) = tokio::try_join!(
            self.store.list_contacts(user_id),
            self.store.list_devices(user_id)
        )
        .map_err(|e| {
            warn!("读取联系人或设备列表失败: user_id={}, error={}", user_id, e);
            ResolverError::from(e)
        })?;

        debug!(
            "收件人解析完成: user_id={}, contacts={}, devices={}",
            user_id,
            contacts.len(),
            devices.len()
        );

        Ok(RecipientSet {
            profile,
            contacts,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::errors::StoreError;
    use alert_testing_utils::{Fixtures, StoreRead};

    #[tokio::test]
    async fn test_resolve_reads_everything() {
        let resolver = RecipientResolver::new(Arc::new(Fixtures::mixed_channel_store()));
        let recipients = resolver.resolve("U1").await.unwrap();
        assert_eq!(recipients.profile.display_name(), Some("Ann"));
        assert_eq!(recipients.contacts.len(), 2);
        assert_eq!(recipients.devices.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let resolver = RecipientResolver::new(Arc::new(Fixtures::mixed_channel_store()));
        let err = resolver.resolve("nobody").await.unwrap_err();
        assert_eq!(
            err,
            ResolverError::NotFound {
                user_id: "nobody".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_partial_read_is_full_failure() {
        let store = Fixtures::mixed_channel_store();
        store.fail_on(
            StoreRead::Devices,
            StoreError::Unavailable("deadline exceeded".to_string()),
        );
        let resolver = RecipientResolver::new(Arc::new(store));
        let err = resolver.resolve("U1").await.unwrap_err();
        assert!(matches!(err, ResolverError::TransportUnavailable { .. }));
    }
}
