//! Loading and saving chart documents.

pub mod csv_import;
pub mod file;

pub use csv_import::{import_csv, import_csv_str, CsvImport};
pub use file::{load_document, save_document};
