// src/export/text.rs

use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::{fs, io::Write, path::Path};
use tracing::debug;

use crate::error::{ConvertError, WriteSource};

/// Writes `rows` as comma-delimited records terminated by `\n`. A field is
/// quoted only when it holds a comma, a quote, CR or LF; quotes are doubled.
pub fn encode_rows<W: Write>(rows: &[Vec<String>], out: W) -> Result<(), WriteSource> {
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(out);

    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates `path`, writes the rows into it and returns its size in bytes.
pub fn write_csv<P: AsRef<Path>>(rows: &[Vec<String>], path: P) -> Result<u64, ConvertError> {
    let path = path.as_ref();
    let write_err = |source: WriteSource| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::create(path).map_err(|e| write_err(e.into()))?;
    encode_rows(rows, file).map_err(write_err)?;
    let size = fs::metadata(path).map_err(|e| write_err(e.into()))?.len();

    debug!(path = %path.display(), rows = rows.len(), bytes = size, "wrote csv");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use csv::ReaderBuilder;
    use tempfile::tempdir;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn encode(rows: &[Vec<String>]) -> Result<String> {
        let mut buf = Vec::new();
        encode_rows(rows, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn quotes_only_when_needed() -> Result<()> {
        let data = rows(&[
            &["plain", "with,comma", "say \"hi\""],
            &["line\nbreak", "", "cr\rhere"],
        ]);
        assert_eq!(
            encode(&data)?,
            "plain,\"with,comma\",\"say \"\"hi\"\"\"\n\"line\nbreak\",,\"cr\rhere\"\n"
        );
        Ok(())
    }

    #[test]
    fn decodes_back_to_the_same_rows() -> Result<()> {
        let data = rows(&[
            &["id", "note", "amount"],
            &["1", "a, b and \"c\"", "10.5"],
            &["2", "", "multi\nline"],
            &["3", "trailing", ""],
        ]);
        let encoded = encode(&data)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .from_reader(encoded.as_bytes());
        let decoded: Vec<Vec<String>> = reader
            .records()
            .map(|rec| rec.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<_, _>>()?;

        assert_eq!(decoded, data);
        Ok(())
    }

    #[test]
    fn write_csv_reports_file_size() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        let size = write_csv(&rows(&[&["a", "b"], &["c", "d"]]), &path)?;

        assert_eq!(size, 8);
        assert_eq!(fs::read_to_string(&path)?, "a,b\nc,d\n");
        Ok(())
    }

    #[test]
    fn empty_table_writes_empty_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.csv");
        assert_eq!(write_csv(&[], &path)?, 0);
        Ok(())
    }

    #[test]
    fn unwritable_target_is_a_write_error() -> Result<()> {
        let dir = tempdir()?;
        let err = write_csv(&rows(&[&["x"]]), dir.path()).unwrap_err();
        assert!(matches!(err, ConvertError::Write { .. }));
        Ok(())
    }
}
