pub mod auth_service;
pub mod session_registry;
pub mod supply_service;

pub use session_registry::SessionRegistry;
pub use supply_service::SupplyService;
