// src/pipeline/mod.rs

use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tracing::{debug, info, instrument};

use crate::error::ConvertError;
use crate::export::{self, ArtifactSizes, ExportSummary};
use crate::extract;
use crate::filter;

pub mod artifact;
pub mod names;

pub use artifact::TempArtifact;
pub use names::{NameGenerator, UuidNames};

/// Extensions calamine can open.
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// A spreadsheet copied into the work dir, owned by the pipeline. The copy
/// is deleted when this value drops, whether or not it was converted.
#[derive(Debug)]
pub struct UploadInput {
    pub original_name: String,
    pub size: u64,
    file: TempArtifact,
}

impl UploadInput {
    /// Takes ownership of an already staged file at `path`.
    pub fn adopt(original_name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            original_name: original_name.into(),
            size,
            file: TempArtifact::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Successful result: the report plus the archive that outlives the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub summary: ExportSummary,
    pub archive_path: PathBuf,
}

impl Conversion {
    /// File name of the archive inside the work dir.
    pub fn archive_name(&self) -> String {
        self.archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Runs extract → filter → CSV → ZIP for one upload at a time. Holds no
/// mutable state, so a single instance can serve concurrent requests.
#[derive(Clone)]
pub struct Converter {
    work_dir: PathBuf,
    names: Arc<dyn NameGenerator>,
}

impl Converter {
    /// Uses `work_dir` for every artifact, creating it if needed.
    pub fn new(work_dir: impl Into<PathBuf>) -> Result<Self, ConvertError> {
        let work_dir = work_dir.into();
        fs::create_dir_all(&work_dir).map_err(|source| ConvertError::Upload {
            context: format!("creating work dir {}", work_dir.display()),
            source,
        })?;
        Ok(Self {
            work_dir,
            names: Arc::new(UuidNames),
        })
    }

    pub fn with_names(mut self, names: Arc<dyn NameGenerator>) -> Self {
        self.names = names;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Copies an upload stream into `<work_dir>/<unique>-<sanitized name>`.
    pub fn stage<R: Read>(&self, original_name: &str, mut reader: R) -> Result<UploadInput, ConvertError> {
        let safe_name = validate_upload_name(original_name)?;
        let path = self
            .work_dir
            .join(format!("{}-{}", self.names.unique(), safe_name));
        let upload_err = |source: io::Error| ConvertError::Upload {
            context: format!("writing {}", path.display()),
            source,
        };

        let staged = UploadInput::adopt(original_name, path.clone(), 0);
        let mut file = File::create(&path).map_err(upload_err)?;
        let size = io::copy(&mut reader, &mut file).map_err(upload_err)?;
        debug!(path = %path.display(), bytes = size, "staged upload");

        Ok(UploadInput { size, ..staged })
    }

    /// Stages a copy of a local file so the original is never touched.
    pub fn stage_file(&self, path: &Path) -> Result<UploadInput, ConvertError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        validate_upload_name(&name)?;
        let file = File::open(path).map_err(|source| ConvertError::Upload {
            context: format!("opening {}", path.display()),
            source,
        })?;
        self.stage(&name, file)
    }

    /// Converts a staged upload. The input copy and the intermediate CSV are
    /// removed before returning; only the archive survives, and only on
    /// success.
    #[instrument(level = "info", skip(self, input), fields(file = %input.original_name))]
    pub fn convert(&self, input: UploadInput) -> Result<Conversion, ConvertError> {
        let start = Instant::now();

        let grid = extract::load_grid(input.path())?;
        let shape = grid.shape();
        let table = filter::filter_rows(&grid);
        drop(grid);

        let csv = TempArtifact::new(self.work_dir.join(format!("{}.csv", self.names.unique())));
        let csv_size = export::write_csv(&table.rows, csv.path())?;

        let zip_path = self.work_dir.join(format!("{}.zip", self.names.unique()));
        let entry_name = format!("{}.csv", upload_stem(&input.original_name));
        let zip_size = export::archive_csv(csv.path(), &entry_name, &zip_path)?;

        let summary = ExportSummary::new(
            shape,
            &table,
            ArtifactSizes {
                original: input.size,
                csv: csv_size,
                zip: zip_size,
            },
        );
        info!(
            rows = summary.rows_written,
            skipped = summary.empty_rows_skipped,
            columns = summary.active_columns,
            csv_bytes = csv_size,
            zip_bytes = zip_size,
            elapsed = ?start.elapsed(),
            "converted"
        );

        Ok(Conversion {
            summary,
            archive_path: zip_path,
        })
    }

    /// Resolves a download request to an archive in the work dir. Only bare
    /// `.zip` file names are accepted.
    pub fn archive_for_download(&self, name: &str) -> Option<PathBuf> {
        let is_bare = !name.is_empty()
            && sanitize_file_name(name) == name
            && name.to_ascii_lowercase().ends_with(".zip");
        if !is_bare {
            return None;
        }
        let path = self.work_dir.join(name);
        path.is_file().then_some(path)
    }
}

/// Rejects missing names and unsupported extensions; returns the sanitized
/// name on success.
pub fn validate_upload_name(name: &str) -> Result<String, ConvertError> {
    if name.trim().is_empty() {
        return Err(ConvertError::MissingInput("No file selected".into()));
    }
    let safe = sanitize_file_name(name);
    let ext = Path::new(&safe)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ConvertError::InvalidFileType(format!(
            "Invalid file type. Only .{} allowed",
            ALLOWED_EXTENSIONS.join(", .")
        )));
    }
    Ok(safe)
}

/// Final path component with anything outside `[A-Za-z0-9._-]` replaced by
/// `_` and leading dots stripped. Never empty.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_start_matches('.') {
        "" => "upload".to_string(),
        s => s.to_string(),
    }
}

fn upload_stem(original_name: &str) -> String {
    let safe = sanitize_file_name(original_name);
    Path::new(&safe)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(safe)
}
