pub mod aggregator;
pub mod compare;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod report;
pub mod runner;
pub mod suite;
pub mod transcript;
pub mod verify;

/// Timestamp used to name report files
pub fn create_timestamp(time: &chrono::DateTime<chrono::Local>) -> String {
    time.format("%Y%m%d_%H%M%S").to_string()
}
