pub mod alert;
pub mod dispatch;
pub mod recipient;
pub mod report;

pub use alert::*;
pub use dispatch::*;
pub use recipient::*;
pub use report::*;
