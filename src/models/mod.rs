mod history;
mod prediction;

pub use history::{DateGroup, HistoryEntry, ImageRef};
pub use prediction::{PredictionResult, RipenessClass};
