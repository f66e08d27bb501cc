// src/export/mod.rs

pub mod archive;
pub mod summary;
pub mod text;

pub use archive::archive_csv;
pub use summary::{compression_ratio, ArtifactSizes, ExportSummary};
pub use text::{encode_rows, write_csv};
