//! Stream driver for the fold engine
//!
//! Pulls records from the source, groups them, folds each group, and
//! writes results onward in original input order. All waiting happens at
//! the I/O boundaries here; the fold itself is pure and sequential.

use crate::error::Result;
use crate::fold::{fold_group, FLAG_COLUMN};
use crate::group::Grouper;
use crate::reader::RecordReader;
use crate::record::Record;
use crate::rule::MatchRule;
use std::io::{Read, Write};

/// Configuration for one fold run, constructed once and passed in by
/// the caller. There is no ambient state.
#[derive(Debug, Clone)]
pub struct FoldOptions {
    /// Column whose value partitions the stream into contiguous groups
    pub group_by: String,
    /// The rule set, ordinary and group-wide rules mixed
    pub rules: Vec<MatchRule>,
    /// Provenance column name, reused if the input already carries it
    pub flag_column: String,
}

impl FoldOptions {
    /// Options with the default provenance column
    pub fn new(group_by: impl Into<String>, rules: Vec<MatchRule>) -> Self {
        Self {
            group_by: group_by.into(),
            rules,
            flag_column: FLAG_COLUMN.to_string(),
        }
    }
}

/// Counters reported after a fold run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldSummary {
    /// Records consumed from the source
    pub records_in: u64,
    /// Records written to the sink
    pub records_out: u64,
    /// Groups folded
    pub groups: u64,
}

/// Fold a whole record stream.
///
/// The output header is the input header with the provenance column
/// appended at the end, unless the input already carries it, in which
/// case that column is reused: each record's merged flag initializes
/// from it, and the fold outcome is written back into it. Upstream
/// parse errors terminate the stream after every complete record read
/// so far has been folded and written; sink write errors abort
/// immediately, without retry.
pub fn fold_stream<R: Read, W: Write>(
    input: R,
    output: W,
    options: &FoldOptions,
) -> Result<FoldSummary> {
    let reader = RecordReader::new(input)?;
    let header = reader.header().clone();

    let existing_flag = header.index_of(&options.flag_column);
    let mut out_header = header.clone();
    let flag_index = match existing_flag {
        Some(index) => index,
        None => out_header.push(options.flag_column.clone()),
    };

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(out_header.names())?;

    let key_index = header.index_of(&options.group_by);
    let mut summary = FoldSummary::default();
    let mut failure = None;

    for item in Grouper::new(reader, key_index) {
        match item {
            Ok(mut group) => {
                summary.groups += 1;
                summary.records_in += group.len() as u64;

                if let Some(index) = existing_flag {
                    for record in &mut group {
                        record.merged = record.get_at(index) == "true";
                    }
                }

                for record in fold_group(&header, group, &options.rules) {
                    summary.records_out += 1;

                    let Record { values: mut row, merged, .. } = record;
                    let flag = if merged { "true" } else { "false" };

                    if existing_flag.is_some() {
                        row[flag_index] = flag.to_string();
                    } else {
                        row.push(flag.to_string());
                    }

                    writer.write_record(&row)?;
                }
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    writer.flush()?;

    match failure {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}
