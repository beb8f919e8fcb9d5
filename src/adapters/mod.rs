// Adapters layer: concrete implementations for the file formats and the
// filesystem the pipeline talks to.

pub mod bundle;
pub mod excel;
pub mod preview;
pub mod product_csv;
pub mod storage;
pub mod xlsx_export;
