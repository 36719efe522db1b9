pub mod exporter;
pub mod history_eraser;
pub mod history_reader;
pub mod input_normalizer;

pub use exporter::{export_history, export_results};
pub use history_eraser::HistoryEraser;
pub use history_reader::{HistoryReader, LoadOutcome, ReaderPhase};
pub use input_normalizer::{normalize, normalize_rows, normalize_text, RawInput};
