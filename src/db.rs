pub mod category_repo;
pub use category_repo::CategoryRepository;
pub mod composite_repo;
pub use composite_repo::CompositeRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod equipment_repo;
pub use equipment_repo::EquipmentRepository;
pub mod exit_order_repo;
pub use exit_order_repo::ExitOrderRepository;
pub mod service_order_repo;
pub use service_order_repo::ServiceOrderRepository;
pub mod transaction_repo;
pub use transaction_repo::TransactionRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
