pub mod account;
pub mod audit_entry;
pub mod server_record;
pub mod snapshot;
pub mod sync_report;
