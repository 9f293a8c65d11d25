pub mod errors;
pub mod statistics;
pub mod store;
pub mod types;

pub use errors::StoreError;
pub use statistics::{
    ClassCount, DailyCount, Statistics, Timeframe, TimeframeStatistics, statistics,
    timeframe_statistics,
};
pub use store::{ClassificationStore, InMemoryStore};
pub use types::{ClassScore, ClassificationRecord, NewClassification};
