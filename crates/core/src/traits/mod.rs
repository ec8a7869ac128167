pub mod dispatcher;
pub mod report_sink;
pub mod transport;
pub mod user_store;

pub use dispatcher::ChannelDispatcher;
pub use report_sink::ReportSink;
pub use transport::{PushTransport, SmsTransport};
pub use user_store::UserDataStore;
