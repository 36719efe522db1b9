pub mod csv_loader;

pub use csv_loader::{load_csv_texts, read_csv_texts, TEXT_COLUMN};
