//! Column reordering: shuffle named columns to the start of the record

use crate::error::{Error, Result};
use crate::reader::RecordReader;
use std::io::{Read, Write};

/// Move the named columns to the front, preserving the relative order
/// of everything else. Unknown targets are an error.
pub fn move_to_front<R: Read, W: Write>(
    input: R,
    columns: &[String],
    output: W,
) -> Result<()> {
    let reader = RecordReader::new(input)?;
    let header = reader.header().clone();

    for column in columns {
        if !header.contains(column) {
            return Err(Error::MissingColumn(column.clone()));
        }
    }

    let rest: Vec<&String> = header
        .names()
        .iter()
        .filter(|name| !columns.contains(*name))
        .collect();

    let mut out_names: Vec<&str> = columns.iter().map(String::as_str).collect();
    out_names.extend(rest.iter().map(|s| s.as_str()));

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&out_names)?;

    for record in reader {
        let record = record?;

        let row: Vec<&str> = out_names
            .iter()
            .map(|name| record.get(&header, name))
            .collect();

        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
