pub mod inventory_store;
pub mod provider;
