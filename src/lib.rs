//! 紧急警报扇出服务
//!
//! 把配置、外部适配器、处理管道和HTTP触发接口组装成一个可运行的服务。

pub mod app;
pub mod shutdown;

pub use app::Application;
pub use shutdown::ShutdownManager;
