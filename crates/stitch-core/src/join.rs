//! Single-key equi-join against an in-memory left table
//!
//! The left table is loaded fully into memory keyed by the join column;
//! the right table streams through. Every right row is emitted, with
//! the matching left row's fields merged in (left wins on shared
//! columns) or left blank when no match exists.

use crate::error::Result;
use crate::reader::RecordReader;
use crate::record::{Header, Record};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Column recording the left row's line number in the left source
pub const LEFT_LINE_COLUMN: &str = "left_original_line_number";
/// Column recording the right row's line number in the right source
pub const RIGHT_LINE_COLUMN: &str = "right_original_line_number";

/// Counters reported after a join
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSummary {
    /// Right rows written
    pub rows: u64,
    /// Right rows that found a left match
    pub matched: u64,
}

/// Join a streamed right table against a fully-loaded left table.
///
/// The output header is the left columns followed by the right table's
/// remaining columns, then the two line-number columns. When the same
/// key appears on several left rows, the last one wins.
pub fn join<L: Read, R: Read, W: Write>(
    key: &str,
    left: L,
    right: R,
    output: W,
) -> Result<JoinSummary> {
    let left_reader = RecordReader::new(left)?;
    let left_header = left_reader.header().clone();

    let mut cache: HashMap<String, Record> = HashMap::new();
    for record in left_reader {
        let record = record?;
        cache.insert(record.get(&left_header, key).to_string(), record);
    }

    let right_reader = RecordReader::new(right)?;
    let right_header = right_reader.header().clone();

    let mut out_header = left_header.clone();
    for name in right_header.names() {
        if !out_header.contains(name) {
            out_header.push(name.clone());
        }
    }
    for provenance in [LEFT_LINE_COLUMN, RIGHT_LINE_COLUMN] {
        if !out_header.contains(provenance) {
            out_header.push(provenance);
        }
    }

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(out_header.names())?;

    let mut summary = JoinSummary::default();

    for record in right_reader {
        let record = record?;
        let matched = cache.get(record.get(&right_header, key));
        if matched.is_some() {
            summary.matched += 1;
        }

        let row: Vec<String> = out_header
            .names()
            .iter()
            .map(|name| cell_for(name, &record, &right_header, matched, &left_header))
            .collect();

        writer.write_record(&row)?;
        summary.rows += 1;
    }

    writer.flush()?;
    Ok(summary)
}

fn cell_for(
    name: &str,
    right: &Record,
    right_header: &Header,
    matched: Option<&Record>,
    left_header: &Header,
) -> String {
    if name == RIGHT_LINE_COLUMN {
        return right.position.to_string();
    }
    if name == LEFT_LINE_COLUMN {
        return matched.map(|r| r.position.to_string()).unwrap_or_default();
    }

    // Left values take precedence on shared columns when a match exists.
    if let Some(left) = matched {
        if left_header.contains(name) {
            return left.get(left_header, name).to_string();
        }
    }

    right.get(right_header, name).to_string()
}
