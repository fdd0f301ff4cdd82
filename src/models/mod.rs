pub mod command;
pub mod document;
pub mod session;

pub use command::*;
pub use document::*;
pub use session::*;
