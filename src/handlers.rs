pub mod admin;
pub mod auth;
pub mod categories;
pub mod composite_items;
pub mod customers;
pub mod equipment;
pub mod exit_orders;
pub mod service_orders;
pub mod transactions;
pub mod users;
