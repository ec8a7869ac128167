use async_trait::async_trait;

use crate::models::{Channel, DispatchResult, DispatchTask};

/// 渠道分发器：对一个已解析目标做恰好一次投递尝试。
///
/// 实现不得把传输失败抛出边界之外，所有失败都转换为
/// `DispatchOutcome::Failed` 结果返回。
#[async_trait]
pub trait ChannelDispatcher: Send + Sync {
    async fn dispatch(&self, task: &DispatchTask) -> DispatchResult;

    fn channel(&self) -> Channel;
}
