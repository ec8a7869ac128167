//! 紧急警报扇出服务的核心类型
//!
//! 包含领域模型、错误类型、端口 trait 和服务配置。具体的传输、存储实现位于 infrastructure crate。

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use errors::*;
pub use models::*;
pub use traits::*;
