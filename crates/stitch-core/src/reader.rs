//! Streaming CSV reader producing header-keyed records

use crate::error::{Error, Result};
use crate::record::{Header, Record};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A streaming reader over one CSV source.
///
/// The header row is consumed eagerly; data rows are yielded one at a
/// time as [`Record`]s. Field counts are strict: a row whose arity does
/// not match the header is malformed input and surfaces as an error,
/// terminating the stream (records already yielded stand).
pub struct RecordReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    header: Header,
    line: u64,
}

impl<R: Read> RecordReader<R> {
    /// Create a reader over any byte source
    pub fn new(input: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(input);

        let header = Header::new(reader.headers()?.iter().map(str::to_string).collect());

        Ok(Self {
            records: reader.into_records(),
            header,
            line: 1,
        })
    }

    /// The stream's header
    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl RecordReader<BufReader<File>> {
    /// Open a CSV file for streaming
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::new(BufReader::new(file)).map_err(|e| match e {
            Error::Malformed(source) => Error::CsvFile {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        self.line += 1;

        match result {
            Ok(row) => Some(Ok(Record::new(
                row.iter().map(str::to_string).collect(),
                self.line,
            ))),
            Err(e) => Some(Err(Error::Malformed(e))),
        }
    }
}

/// Read only the header row of a CSV file
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<Header> {
    Ok(RecordReader::from_path(path)?.header().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_simple_csv() {
        let csv = "id,start,end\none,9am,11am\ntwo,11am,5pm\n";
        let mut reader = RecordReader::new(csv.as_bytes()).unwrap();

        assert_eq!(reader.header().names(), &["id", "start", "end"]);

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.values, vec!["one", "9am", "11am"]);
        assert_eq!(first.position, 2);
        assert!(!first.merged);

        let second = reader.next().unwrap().unwrap();
        assert_eq!(second.position, 3);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_wrong_arity_is_an_error() {
        let csv = "id,start,end\none,9am,11am\ntwo,11am\n";
        let reader = RecordReader::new(csv.as_bytes()).unwrap();
        let rows: Vec<_> = reader.collect();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_ok());
        assert!(rows[1].is_err());
    }

    #[test]
    fn test_bom_stripped_from_header() {
        let csv = "\u{feff}id,start\none,9am\n";
        let reader = RecordReader::new(csv.as_bytes()).unwrap();
        assert_eq!(reader.header().names()[0], "id");
    }
}
