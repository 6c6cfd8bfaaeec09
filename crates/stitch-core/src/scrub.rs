//! Per-cell cleanup transforms
//!
//! A grab-bag of column scrubbing operations applied record-at-a-time
//! over a set of target columns (default: every column). Options are a
//! typed struct, validated up front; there is no stringly-typed flag
//! map anywhere.

use crate::error::{Error, Result};
use crate::reader::RecordReader;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::io::{Read, Write};

/// One from/to pair for cell or character replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    /// Parse a flat tuple list, `A,B,X,Y` meaning A->B and X->Y
    pub fn parse_list(input: &str) -> Result<Vec<Self>> {
        let parts: Vec<&str> = input.split(',').collect();
        if parts.len() % 2 != 0 {
            return Err(Error::InvalidOptions(format!(
                "replacement list '{input}' must contain from,to pairs"
            )));
        }

        Ok(parts
            .chunks(2)
            .map(|pair| Self {
                from: pair[0].to_string(),
                to: pair[1].to_string(),
            })
            .collect())
    }
}

/// Left-pad configuration: prepend `pad` until the cell reaches `width`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeftPad {
    pub pad: String,
    pub width: usize,
}

impl LeftPad {
    /// Parse `PAD,WIDTH`, eg `0,6`
    pub fn parse(input: &str) -> Result<Self> {
        let (pad, width) = input
            .split_once(',')
            .ok_or_else(|| Error::InvalidOptions(format!("left-pad '{input}' must be PAD,WIDTH")))?;

        let width = width.parse().map_err(|_| {
            Error::InvalidOptions(format!("left-pad width '{width}' is not a number"))
        })?;

        Ok(Self {
            pad: pad.to_string(),
            width,
        })
    }
}

/// An input/output layout pair for date or time re-formatting, already
/// mapped onto chrono patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reformat {
    pub input: String,
    pub output: String,
}

impl Reformat {
    /// Parse `INPUT,OUTPUT` in date tokens:
    /// `YYYY` `YY` `MM` `SHORTMONTH` `DD` `hh` `mm` `ss`
    pub fn parse_date(spec: &str) -> Result<Self> {
        Self::parse(spec, map_date_tokens)
    }

    /// Parse `INPUT,OUTPUT` in time tokens: `HH` `MM` `SS`
    pub fn parse_time(spec: &str) -> Result<Self> {
        Self::parse(spec, map_time_tokens)
    }

    fn parse(spec: &str, map: fn(&str) -> String) -> Result<Self> {
        let (input, output) = spec.split_once(',').ok_or_else(|| {
            Error::InvalidOptions(format!("reformat '{spec}' must be INPUT,OUTPUT"))
        })?;

        Ok(Self {
            input: map(input),
            output: map(output),
        })
    }
}

fn map_date_tokens(layout: &str) -> String {
    layout
        .replace("YYYY", "%Y")
        .replace("YY", "%y")
        .replace("MM", "%m")
        .replace("SHORTMONTH", "%b")
        .replace("DD", "%d")
        .replace("hh", "%H")
        .replace("mm", "%M")
        .replace("ss", "%S")
}

fn map_time_tokens(layout: &str) -> String {
    layout
        .replace("HH", "%H")
        .replace("MM", "%M")
        .replace("SS", "%S")
}

/// The full set of scrub operations for one pass.
///
/// Operations apply in a fixed order per cell; several may be active at
/// once. Empty `columns` targets every column.
#[derive(Debug, Clone, Default)]
pub struct ScrubOptions {
    /// Target columns; empty means all
    pub columns: Vec<String>,
    pub strip_leading_zeroes: bool,
    pub left_pad: Option<LeftPad>,
    pub unquote: bool,
    pub commas_to_points: bool,
    /// Replace blank cells with this value
    pub add_missing: Option<String>,
    pub replace_cell: Vec<Replacement>,
    /// Like replace_cell, but `to` names a column whose value is taken
    pub replace_cell_lookup: Vec<Replacement>,
    pub replace_char: Vec<Replacement>,
    /// New name for the single target column
    pub rename: Option<String>,
    /// Split each target on this delimiter into a fresh suffixed column
    pub split_on: Option<String>,
    /// Copy each target into a fresh suffixed column
    pub copy: bool,
    /// Drop the target columns
    pub drop: bool,
    /// Remove alphabetic characters
    pub stomp_alphas: bool,
    /// Delete rows where a target cell equals this value
    pub delete_where: Option<String>,
    /// Delete rows where a target cell does not equal this value
    pub delete_where_not: Option<String>,
    pub trim_whitespace: bool,
    /// Move a trailing marker character to the front of the cell
    pub back_to_front: Option<String>,
    pub reformat_date: Option<Reformat>,
    pub reformat_time: Option<Reformat>,
    /// Replace dots, dashes and spaces in target header names with
    /// underscores
    pub clean_headers: bool,
}

impl ScrubOptions {
    /// Validate option combinations that the type system cannot rule out
    pub fn validate(&self) -> Result<()> {
        if self.rename.is_some() && self.columns.len() != 1 {
            return Err(Error::InvalidOptions(
                "rename requires exactly one target column".to_string(),
            ));
        }
        Ok(())
    }
}

/// Counters reported after a scrub pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrubSummary {
    pub rows_in: u64,
    pub rows_out: u64,
}

/// Find a fresh `name_N` column name that collides with nothing
fn suffixed(target: &str, taken: &[String]) -> String {
    let mut n = 1;
    loop {
        let candidate = format!("{target}_{n}");
        if !taken.iter().any(|name| name == &candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn clean_header(name: &str) -> String {
    name.replace('.', "_")
        .replace('-', "_")
        .trim_matches(' ')
        .replace(' ', "_")
}

/// Run one scrub pass over a record stream
pub fn scrub<R: Read, W: Write>(
    input: R,
    output: W,
    options: &ScrubOptions,
) -> Result<ScrubSummary> {
    options.validate()?;

    let reader = RecordReader::new(input)?;
    let in_names: Vec<String> = reader.header().names().to_vec();

    let targets: Vec<String> = if options.columns.is_empty() {
        in_names.clone()
    } else {
        options.columns.clone()
    };

    // Derived column names, one per target, used by split and copy.
    let mut derived: HashMap<String, String> = HashMap::new();
    let mut out_names = in_names.clone();

    if let Some(new_name) = &options.rename {
        for name in &mut out_names {
            if name == &targets[0] {
                *name = new_name.clone();
            }
        }
    }

    if options.split_on.is_some() || options.copy {
        for target in &targets {
            let fresh = suffixed(target, &out_names);
            out_names.push(fresh.clone());
            derived.insert(target.clone(), fresh);
        }
    }

    if options.drop {
        out_names.retain(|name| !targets.contains(name));
    }

    if options.clean_headers {
        for name in &mut out_names {
            if targets.contains(name) {
                *name = clean_header(name);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&out_names)?;

    let mut summary = ScrubSummary::default();

    for record in reader {
        let record = record?;
        summary.rows_in += 1;

        // Header-keyed working copy of the row, mirrored from the
        // original header so renamed and derived columns can be added.
        let mut cells: HashMap<String, String> = in_names
            .iter()
            .cloned()
            .zip(record.values.into_iter())
            .collect();

        let mut delete = false;

        for target in &targets {
            let mut cell = cells.get(target.as_str()).cloned().unwrap_or_default();
            let written_name = if options.clean_headers {
                clean_header(target)
            } else {
                target.clone()
            };

            if options.strip_leading_zeroes {
                cell = cell.trim_start_matches('0').to_string();
            }

            if let Some(pad) = &options.left_pad {
                while cell.len() < pad.width {
                    cell = format!("{}{}", pad.pad, cell);
                }
            }

            if options.unquote {
                cell = cell
                    .trim_matches('"')
                    .trim_matches('\'')
                    .to_string();
            }

            if options.commas_to_points {
                cell = cell.replace(',', ".");
            }

            if let Some(fill) = &options.add_missing {
                if cell.is_empty() {
                    cell = fill.clone();
                }
            }

            for rep in &options.replace_cell {
                if cell == rep.from {
                    cell = rep.to.clone();
                }
            }

            for rep in &options.replace_cell_lookup {
                if cell == rep.from {
                    cell = cells.get(rep.to.as_str()).cloned().unwrap_or_default();
                }
            }

            for rep in &options.replace_char {
                cell = cell.replace(&rep.from, &rep.to);
            }

            if options.stomp_alphas {
                cell.retain(|c| !c.is_ascii_alphabetic());
            }

            cells.insert(written_name.clone(), cell.clone());

            if let Some(new_name) = &options.rename {
                cells.insert(new_name.clone(), cell.clone());
            }

            if let Some(delim) = &options.split_on {
                if let Some((head, tail)) = cell.split_once(delim.as_str()) {
                    cells.insert(written_name.clone(), head.to_string());
                    if let Some(fresh) = derived.get(target.as_str()) {
                        cells.insert(fresh.clone(), tail.to_string());
                    }
                }
            }

            if options.copy {
                if let Some(fresh) = derived.get(target.as_str()) {
                    cells.insert(fresh.clone(), cell.clone());
                }
            }

            if let Some(value) = &options.delete_where {
                if &cell == value {
                    delete = true;
                }
            }

            if let Some(value) = &options.delete_where_not {
                if &cell != value {
                    delete = true;
                }
            }

            if options.trim_whitespace {
                if let Some(current) = cells.get_mut(written_name.as_str()) {
                    *current = current.trim_matches(' ').to_string();
                }
            }

            if let Some(marker) = &options.back_to_front {
                if let Some(current) = cells.get(written_name.as_str()) {
                    if let Some(stripped) = current.strip_suffix(marker.as_str()) {
                        let moved = format!("{marker}{stripped}");
                        cells.insert(written_name.clone(), moved);
                    }
                }
            }

            if let Some(format) = &options.reformat_date {
                reformat_date_cell(&mut cells, &written_name, format);
            }

            if let Some(format) = &options.reformat_time {
                reformat_time_cell(&mut cells, &written_name, format);
            }
        }

        if !delete {
            let row: Vec<&str> = out_names
                .iter()
                .map(|name| cells.get(name.as_str()).map(String::as_str).unwrap_or(""))
                .collect();
            writer.write_record(&row)?;
            summary.rows_out += 1;
        }
    }

    writer.flush()?;
    Ok(summary)
}

fn reformat_date_cell(cells: &mut HashMap<String, String>, name: &str, format: &Reformat) {
    let Some(value) = cells.get(name).cloned() else {
        return;
    };

    let reformatted = NaiveDateTime::parse_from_str(&value, &format.input)
        .map(|dt| dt.format(&format.output).to_string())
        .or_else(|_| {
            NaiveDate::parse_from_str(&value, &format.input)
                .map(|d| d.format(&format.output).to_string())
        });

    match reformatted {
        Ok(fresh) => {
            cells.insert(name.to_string(), fresh);
        }
        Err(_) => eprintln!("Warning: ignoring garbled date in column '{name}': {value}"),
    }
}

fn reformat_time_cell(cells: &mut HashMap<String, String>, name: &str, format: &Reformat) {
    let Some(value) = cells.get(name).cloned() else {
        return;
    };

    match NaiveTime::parse_from_str(&value, &format.input) {
        Ok(time) => {
            cells.insert(name.to_string(), time.format(&format.output).to_string());
        }
        Err(_) => eprintln!("Warning: ignoring garbled time in column '{name}': {value}"),
    }
}
