pub mod reorder;
pub mod trend;
pub mod zscore;

pub use reorder::ReorderPlanner;
pub use trend::{DemandForecaster, LinearFit};
pub use zscore::ZScoreDetector;
