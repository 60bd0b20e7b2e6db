pub mod batch;
pub mod features;
pub mod monitor;
pub mod scoring;
pub mod thresholds;
