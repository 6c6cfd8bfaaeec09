//! Contiguous-run grouping of an ordered record stream

use crate::error::{Error, Result};
use crate::record::Record;

/// Batches consecutive records sharing one group-key value.
///
/// The input is assumed already ordered by the key; there is no internal
/// sort. A non-contiguous key value therefore opens a fresh group rather
/// than rejoining an earlier one. A `None` key index (the key column is
/// absent) keys every record as empty, producing a single group.
///
/// On an upstream read error the open group is yielded first, so every
/// complete record read so far is surfaced, then the error.
pub struct Grouper<I> {
    records: I,
    key_index: Option<usize>,
    current: Vec<Record>,
    current_key: String,
    stashed: Option<Error>,
    done: bool,
}

impl<I> Grouper<I>
where
    I: Iterator<Item = Result<Record>>,
{
    /// Create a grouper keyed on the given header index
    pub fn new(records: I, key_index: Option<usize>) -> Self {
        Self {
            records,
            key_index,
            current: Vec::new(),
            current_key: String::new(),
            stashed: None,
            done: false,
        }
    }

    fn key_of<'a>(&self, record: &'a Record) -> &'a str {
        match self.key_index {
            Some(index) => record.get_at(index),
            None => "",
        }
    }
}

impl<I> Iterator for Grouper<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<Vec<Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.stashed.take() {
            return Some(Err(err));
        }
        if self.done {
            return None;
        }

        loop {
            match self.records.next() {
                Some(Ok(record)) => {
                    let key = self.key_of(&record).to_string();

                    if self.current.is_empty() {
                        self.current_key = key;
                        self.current.push(record);
                    } else if key == self.current_key {
                        self.current.push(record);
                    } else {
                        let group = std::mem::take(&mut self.current);
                        self.current_key = key;
                        self.current.push(record);
                        return Some(Ok(group));
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    if self.current.is_empty() {
                        return Some(Err(err));
                    }
                    self.stashed = Some(err);
                    return Some(Ok(std::mem::take(&mut self.current)));
                }
                None => {
                    self.done = true;
                    if self.current.is_empty() {
                        return None;
                    }
                    return Some(Ok(std::mem::take(&mut self.current)));
                }
            }
        }
    }
}
