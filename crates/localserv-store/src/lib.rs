pub mod csv;
pub mod error;
pub mod jsonl;
pub mod query;

pub use csv::CsvSink;
pub use error::StoreError;
pub use jsonl::JsonlSink;
pub use query::{query_rows, RowFilter, SortKey, SortOrder};
