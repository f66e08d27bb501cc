// src/error.rs

use std::{error::Error as _, io, path::PathBuf};
use thiserror::Error;

/// Underlying cause of a failed CSV write.
#[derive(Debug, Error)]
pub enum WriteSource {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Underlying cause of a failed archive write.
#[derive(Debug, Error)]
pub enum ArchiveSource {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

/// Every way a single conversion can fail. All variants are terminal for
/// the request that produced them; nothing is retried.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{0}")]
    MissingInput(String),

    #[error("{0}")]
    InvalidFileType(String),

    #[error("failed to stage upload ({context})")]
    Upload {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read spreadsheet {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("failed to write CSV {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: WriteSource,
    },

    #[error("failed to create ZIP archive {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: ArchiveSource,
    },
}

impl ConvertError {
    /// Stable name of the failure kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::MissingInput(_) => "MissingInput",
            ConvertError::InvalidFileType(_) => "InvalidFileType",
            ConvertError::Upload { .. } => "UploadFailure",
            ConvertError::Parse { .. } => "ParseError",
            ConvertError::Write { .. } => "WriteError",
            ConvertError::Archive { .. } => "ArchiveError",
        }
    }

    /// Rejections caused by the request itself rather than by processing it.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingInput(_) | ConvertError::InvalidFileType(_)
        )
    }

    /// Human-readable text for the response envelope. Server-side paths stay
    /// out of it; `details()` carries them.
    pub fn message(&self) -> String {
        let what = match self {
            ConvertError::MissingInput(msg) | ConvertError::InvalidFileType(msg) => {
                return msg.clone()
            }
            ConvertError::Upload { .. } => "failed to stage upload",
            ConvertError::Parse { .. } => "failed to read spreadsheet",
            ConvertError::Write { .. } => "failed to write CSV",
            ConvertError::Archive { .. } => "failed to create ZIP archive",
        };
        match self.source() {
            Some(cause) => format!("Error: {}: {}", what, cause),
            None => format!("Error: {}", what),
        }
    }

    /// Full cause chain, for operator-facing logs only.
    pub fn details(&self) -> String {
        let mut out = format!("{:?}", self);
        let mut cause = self.source();
        while let Some(err) = cause {
            out.push_str("\ncaused by: ");
            out.push_str(&err.to_string());
            cause = err.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_plain_message() {
        let err = ConvertError::MissingInput("No file uploaded".into());
        assert!(err.is_client_error());
        assert_eq!(err.message(), "No file uploaded");
        assert_eq!(err.kind(), "MissingInput");
    }

    #[test]
    fn server_errors_include_the_cause() {
        let err = ConvertError::Archive {
            path: PathBuf::from("uploads/x.zip"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied").into(),
        };
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "ArchiveError");
        assert_eq!(
            err.message(),
            "Error: failed to create ZIP archive: denied"
        );
        assert!(err.details().contains("caused by: denied"));
    }

    #[test]
    fn staged_paths_stay_out_of_the_message() {
        let err = ConvertError::Parse {
            path: PathBuf::from("uploads/0f3a-bad.xlsx"),
            source: calamine::Error::Msg("not a workbook"),
        };
        assert_eq!(err.message(), "Error: failed to read spreadsheet: not a workbook");
        assert!(err.details().contains("0f3a-bad.xlsx"));

        let err = ConvertError::Upload {
            context: "writing uploads/0f3a-bad.xlsx".into(),
            source: io::Error::other("disk full"),
        };
        assert_eq!(err.message(), "Error: failed to stage upload: disk full");
    }
}
