//! stitch-core: Core library for streaming CSV record transforms
//!
//! This library provides functionality to:
//! - Read delimited files into header-keyed record streams
//! - Fold adjacent records of a group into merged rows under a
//!   configurable rule set, with provenance tracking
//! - Scrub cell values (padding, trimming, replacement, date and time
//!   re-formatting) and reshape columns
//! - Union directories of CSV files, join two tables on a key, dump
//!   schemas, reorder columns and convert delimiters

pub mod concat;
pub mod convert;
pub mod error;
pub mod fold;
pub mod front;
pub mod group;
pub mod join;
pub mod reader;
pub mod record;
pub mod rule;
pub mod schema;
pub mod scrub;
pub mod stream;
pub mod union;

pub use concat::{concat, load_targets, ConcatTarget};
pub use convert::convert_delimiter;
pub use error::{Error, Result};
pub use fold::{any_match, fold_group, FLAG_COLUMN};
pub use front::move_to_front;
pub use group::Grouper;
pub use join::{join, JoinSummary};
pub use reader::RecordReader;
pub use record::{Header, Record};
pub use rule::{evaluate, load_rules, Comparand, MatchRule};
pub use schema::dump_schema;
pub use scrub::{scrub, LeftPad, Reformat, Replacement, ScrubOptions, ScrubSummary};
pub use stream::{fold_stream, FoldOptions, FoldSummary};
pub use union::{union_directory, union_files, UnionSummary};
