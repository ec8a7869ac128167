//! 外部协作者的具体实现
//!
//! - [`TwilioSmsTransport`]：Twilio 兼容的 REST 短信传输
//! - [`FcmPushTransport`]：FCM v1 兼容的 REST 推送传输
//! - [`FirestoreUserDataStore`]：Firestore REST 用户数据存储
//! - [`InMemoryUserDataStore`]：内存用户数据存储，可从 JSON 种子加载
//! - [`ObservabilityReportSink`]：把扇出报告写入日志和指标

pub mod fcm_push;
pub mod firestore_store;
mod http;
pub mod memory_store;
pub mod observability;
pub mod twilio_sms;

pub use fcm_push::FcmPushTransport;
pub use firestore_store::FirestoreUserDataStore;
pub use memory_store::{InMemoryUserDataStore, SeedData, SeedUser};
pub use observability::{MetricsCollector, ObservabilityReportSink};
pub use twilio_sms::TwilioSmsTransport;
