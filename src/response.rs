// src/response.rs

use serde::Serialize;

use crate::error::ConvertError;
use crate::pipeline::Conversion;

/// Public path prefix under which archives are downloadable.
pub const DOWNLOAD_PREFIX: &str = "uploads";

/// The `{success: bool, ...}` envelope every request answers with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Converted(ConversionReport),
    Failed {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

/// Success payload. Sizes are KiB rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub original_size: f64,
    pub csv_size: f64,
    pub zip_size: f64,
    pub compression_ratio: f64,
    pub zip_file: String,
    pub rows_written: usize,
    pub excel_dimensions: String,
    pub total_columns_in_excel: usize,
    pub columns_with_data: usize,
    pub empty_rows_skipped: usize,
}

impl ApiResponse {
    pub fn converted(conversion: &Conversion) -> Self {
        let s = &conversion.summary;
        Self {
            success: true,
            body: ResponseBody::Converted(ConversionReport {
                original_size: kib(s.original_size),
                csv_size: kib(s.csv_size),
                zip_size: kib(s.zip_size),
                compression_ratio: s.compression_ratio,
                zip_file: format!("{}/{}", DOWNLOAD_PREFIX, conversion.archive_name()),
                rows_written: s.rows_written,
                excel_dimensions: s.dimensions.clone(),
                total_columns_in_excel: s.total_columns,
                columns_with_data: s.active_columns,
                empty_rows_skipped: s.empty_rows_skipped,
            }),
        }
    }

    /// Failure envelope; `with_details` adds the cause chain for operators.
    pub fn failed(err: &ConvertError, with_details: bool) -> Self {
        Self {
            success: false,
            body: ResponseBody::Failed {
                message: err.message(),
                details: with_details.then(|| err.details()),
            },
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: false,
            body: ResponseBody::Failed {
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Bytes to KiB, two decimals.
pub fn kib(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}
