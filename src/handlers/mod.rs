pub mod alerts;
pub mod command;
pub mod supplies;

pub use alerts::*;
pub use command::*;
pub use supplies::*;
