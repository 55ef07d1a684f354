pub mod accounts;
pub mod init;
pub mod log;
pub mod servers;
pub mod sync;
