pub mod ingest;
pub mod utils;

pub use ingest::ingest_workbook;
