pub mod classification;
pub mod history;
pub mod identity;
pub mod loaders;
pub mod test_case;

pub use classification::{ClassificationResult, Prediction, DEFAULT_LABELS};
pub use history::{DateFilter, HistoryRecord, NewRecord, Page, PageCursor, PageQuery};
pub use identity::{RecordId, UserId};
pub use loaders::load_csv_texts;
pub use test_case::{InputSource, TestCase, MIN_TEST_CASE_LEN};
