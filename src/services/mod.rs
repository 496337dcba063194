pub mod scan_manager;
pub mod scan_store;
pub mod scanner;
pub mod worker;
