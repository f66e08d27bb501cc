// src/export/archive.rs

use std::{
    fs::{self, File},
    io,
    path::Path,
};
use tracing::{debug, warn};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::error::{ArchiveSource, ConvertError};

/// Highest DEFLATE level.
const DEFLATE_MAX_LEVEL: i64 = 9;

/// Packs `csv_path` into a new single-entry ZIP at `zip_path`, stored under
/// `entry_name` with maximum DEFLATE compression. Returns the archive size.
///
/// A half-written archive is removed before the error is returned.
pub fn archive_csv(csv_path: &Path, entry_name: &str, zip_path: &Path) -> Result<u64, ConvertError> {
    let archive_err = |source: ArchiveSource| ConvertError::Archive {
        path: zip_path.to_path_buf(),
        source,
    };

    let file = File::create(zip_path).map_err(|e| archive_err(e.into()))?;
    let written = fill_archive(file, csv_path, entry_name)
        .and_then(|()| Ok(fs::metadata(zip_path)?.len()));

    match written {
        Ok(size) => {
            debug!(zip = %zip_path.display(), entry = entry_name, bytes = size, "wrote archive");
            Ok(size)
        }
        Err(source) => {
            if let Err(e) = fs::remove_file(zip_path) {
                warn!(zip = %zip_path.display(), "could not remove partial archive: {}", e);
            }
            Err(archive_err(source))
        }
    }
}

fn fill_archive(file: File, csv_path: &Path, entry_name: &str) -> Result<(), ArchiveSource> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(DEFLATE_MAX_LEVEL));

    zip.start_file(entry_name, options)?;
    let mut csv = File::open(csv_path)?;
    io::copy(&mut csv, &mut zip)?;
    zip.finish()?;
    Ok(())
}
