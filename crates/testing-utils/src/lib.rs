//! # 警报测试工具
//!
//! 警报扇出工作区共享的测试工具。
//!
//! - **模拟存储**: 可注入读取失败的内存 `UserDataStore`
//! - **模拟通道**: 按目标预设行为（成功、延迟、失败、挂起、panic）并统计在途数的短信与推送替身
//! - **记录型 Sink**: 捕获每个已发布的 `FanOutReport`
//! - **构建器**: 带默认值的联系人、设备与警报事件
//!
//! 作为开发依赖引入:
//!
//! ```toml
//! [dev-dependencies]
//! alert-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
