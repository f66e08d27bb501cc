// src/lib.rs

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod filter;
pub mod pipeline;
pub mod response;

pub use error::ConvertError;
pub use export::ExportSummary;
pub use pipeline::{Conversion, Converter, UploadInput};
