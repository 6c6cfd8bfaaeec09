//! Column concatenation driven by a targets table
//!
//! Each target names a destination column built by joining several
//! source columns with a separator. Source columns are consumed;
//! everything else passes through ahead of the destinations.

use crate::error::{Error, Result};
use crate::reader::RecordReader;
use std::io::{Read, Write};
use std::path::Path;

/// One destination column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatTarget {
    /// Output column name
    pub dest: String,
    /// Source columns, joined in order
    pub sources: Vec<String>,
    /// Separator placed between source values
    pub separator: String,
}

/// Load targets from a CSV file with columns `dest`, `sources`
/// (colon-separated) and `sep`
pub fn load_targets<P: AsRef<Path>>(path: P) -> Result<Vec<ConcatTarget>> {
    let reader = RecordReader::from_path(path)?;
    let header = reader.header().clone();

    let mut targets = Vec::new();
    for record in reader {
        let record = record?;
        targets.push(ConcatTarget {
            dest: record.get(&header, "dest").to_string(),
            sources: record
                .get(&header, "sources")
                .split(':')
                .map(str::to_string)
                .collect(),
            separator: record.get(&header, "sep").to_string(),
        });
    }

    Ok(targets)
}

/// Concatenate source columns into destination columns
pub fn concat<R: Read, W: Write>(
    input: R,
    targets: &[ConcatTarget],
    output: W,
) -> Result<()> {
    let reader = RecordReader::new(input)?;
    let header = reader.header().clone();

    for target in targets {
        for source in &target.sources {
            if !header.contains(source) {
                return Err(Error::MissingColumn(source.clone()));
            }
        }
    }

    let consumed: Vec<&String> = targets.iter().flat_map(|t| &t.sources).collect();
    let passthrough: Vec<&String> = header
        .names()
        .iter()
        .filter(|name| !consumed.contains(name))
        .collect();

    let mut out_names: Vec<&str> = passthrough.iter().map(|s| s.as_str()).collect();
    out_names.extend(targets.iter().map(|t| t.dest.as_str()));

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&out_names)?;

    for record in reader {
        let record = record?;

        let mut row: Vec<String> = passthrough
            .iter()
            .map(|name| record.get(&header, name).to_string())
            .collect();

        for target in targets {
            let joined: Vec<&str> = target
                .sources
                .iter()
                .map(|source| record.get(&header, source))
                .collect();
            row.push(joined.join(&target.separator));
        }

        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
