use async_trait::async_trait;

use crate::errors::TransportError;

/// 短信传输，每次调用对应一个收件人
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// 成功时返回传输方分配的消息ID
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<String, TransportError>;

    fn name(&self) -> &str;
}

/// 推送传输
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// 成功时返回投递回执
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<String, TransportError>;

    fn name(&self) -> &str;
}
