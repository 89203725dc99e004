pub mod page;
pub mod records;

pub use page::{Page, SortDir};
pub use records::{Record, RecordStore, StoreError};
