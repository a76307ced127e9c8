pub mod auth;
pub mod composite_service;
pub mod customer_service;
pub mod equipment_service;
pub mod exit_order_service;
pub mod service_order_service;
pub mod user_service;

pub use auth::AuthService;
pub use composite_service::CompositeService;
pub use customer_service::CustomerService;
pub use equipment_service::EquipmentService;
pub use exit_order_service::ExitOrderService;
pub use service_order_service::ServiceOrderService;
pub use user_service::UserService;
