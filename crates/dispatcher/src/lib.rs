//! 紧急警报扇出管道
//!
//! 收件人解析、渠道分发、有界并发的扇出协调、结果汇总与重试建议，
//! 以及把它们串起来的 [`AlertPipeline`]。

pub mod aggregator;
pub mod channels;
pub mod coordinator;
pub mod dedup;
pub mod pipeline;
pub mod resolver;
pub mod retry_service;

pub use aggregator::{classify, ResultAggregator};
pub use channels::{EmailDispatcher, PushDispatcher, SmsDispatcher, PUSH_BODY, PUSH_TITLE};
pub use coordinator::{FanOutCoordinator, FanOutPlan, PlanEntry};
pub use dedup::{DuplicateGuard, DuplicateKind, GuardPermit};
pub use pipeline::AlertPipeline;
pub use resolver::RecipientResolver;
pub use retry_service::RetryAdvisor;
