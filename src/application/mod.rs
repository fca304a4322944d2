pub mod builders;
pub mod config_store;
pub mod connections;
pub mod registry;
pub mod services;
