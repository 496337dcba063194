pub use super::media_scans::Entity as MediaScans;
