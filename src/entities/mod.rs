pub mod prelude;

pub mod media_scans;

pub use media_scans::ScanStatus;
