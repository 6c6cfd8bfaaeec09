//! Multi-file union
//!
//! Concatenates a directory of CSV files onto one unified header (the
//! first-seen-order union of every file's columns), recording where
//! each row came from in two provenance columns.

use crate::error::{Error, Result};
use crate::reader::{read_header, RecordReader};
use crate::record::Header;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Column recording each row's source file
pub const FILE_COLUMN: &str = "original_file_name";
/// Column recording each row's line number in its source file
pub const ROW_COLUMN: &str = "original_row_number";

/// Counters reported after a union
#[derive(Debug, Clone, Default)]
pub struct UnionSummary {
    pub files: Vec<PathBuf>,
    pub rows: u64,
}

/// List the CSV files directly inside a directory, sorted by name
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path.to_path_buf());
        }
    }

    files.sort();

    if files.is_empty() {
        return Err(Error::NoInputFiles(dir.to_path_buf()));
    }

    Ok(files)
}

/// Compute the unified output header: the first-seen-order union of
/// every file's columns, plus the two provenance columns (reused if a
/// source already carries them)
pub fn union_header(files: &[PathBuf]) -> Result<Header> {
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for file in files {
        for name in read_header(file)?.names() {
            if seen.insert(name.clone()) {
                names.push(name.clone());
            }
        }
    }

    let mut header = Header::new(names);
    for provenance in [FILE_COLUMN, ROW_COLUMN] {
        if !header.contains(provenance) {
            header.push(provenance);
        }
    }

    Ok(header)
}

/// Union a set of CSV files into one output stream
pub fn union_files<W: Write>(files: &[PathBuf], output: W) -> Result<UnionSummary> {
    let header = union_header(files)?;

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(header.names())?;

    let mut summary = UnionSummary {
        files: files.to_vec(),
        rows: 0,
    };

    for file in files {
        let reader = RecordReader::from_path(file)?;
        let file_header = reader.header().clone();
        let file_name = file.display().to_string();

        // Unified index -> source index, fixed per file.
        let mapping: Vec<Option<usize>> = header
            .names()
            .iter()
            .map(|name| file_header.index_of(name))
            .collect();

        for record in reader {
            let record = record.map_err(|e| match e {
                Error::Malformed(source) => Error::CsvFile {
                    path: file.clone(),
                    source,
                },
                other => other,
            })?;

            let row: Vec<String> = header
                .names()
                .iter()
                .zip(&mapping)
                .map(|(name, source_index)| {
                    if name == FILE_COLUMN {
                        file_name.clone()
                    } else if name == ROW_COLUMN {
                        record.position.to_string()
                    } else {
                        source_index
                            .map(|i| record.get_at(i).to_string())
                            .unwrap_or_default()
                    }
                })
                .collect();

            writer.write_record(&row)?;
            summary.rows += 1;
        }
    }

    writer.flush()?;
    Ok(summary)
}

/// Union every CSV file directly inside a directory
pub fn union_directory<W: Write>(dir: &Path, output: W) -> Result<UnionSummary> {
    let files = list_csv_files(dir)?;
    union_files(&files, output)
}
