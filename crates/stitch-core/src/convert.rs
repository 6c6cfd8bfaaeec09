//! Delimiter conversion: alternate-delimiter input to standard CSV

use crate::error::Result;
use std::io::{Read, Write};

/// Re-read the input under the given delimiter and emit standard
/// comma-separated CSV, header included, records untouched
pub fn convert_delimiter<R: Read, W: Write>(input: R, delimiter: u8, output: W) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_reader(input);

    let mut writer = csv::Writer::from_writer(output);

    for record in reader.records() {
        writer.write_record(&record?)?;
    }

    writer.flush()?;
    Ok(())
}
