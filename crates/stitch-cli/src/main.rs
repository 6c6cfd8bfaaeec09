//! Stitch CLI
//!
//! Command-line tools for streaming CSV transforms: folding adjacent
//! records, scrubbing cells, unioning files, joining tables and
//! reshaping columns. Every subcommand streams stdin to stdout unless
//! --input/--output name files; summaries and warnings go to stderr.

use clap::{Parser, Subcommand};
use stitch_core::{
    concat, convert_delimiter, dump_schema, fold_stream, join, load_rules, load_targets,
    move_to_front, scrub, union_directory, FoldOptions, LeftPad, MatchRule, Reformat,
    Replacement, ScrubOptions, FLAG_COLUMN,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stitch-cli")]
#[command(about = "Streaming CSV record transforms", long_about = None)]
#[command(version)]
struct Cli {
    /// Tone down the output noise
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge adjacent records of each group under a rule set
    Fold {
        /// Input CSV file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column whose value delimits contiguous groups
        #[arg(short, long)]
        group_by: String,

        /// Match rule specs, eg `id:id,end:start`. Prefix `!` inverts,
        /// `?` makes the rule a group-wide gate; `col=value` compares
        /// the incoming record to a literal, `col:=value` the
        /// accumulator
        #[arg(short, long = "match")]
        match_specs: Vec<String>,

        /// JSON file with additional match rules
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Name of the provenance column
        #[arg(long, default_value = FLAG_COLUMN)]
        flag_column: String,
    },

    /// Clean up cell values in the target columns
    Scrub {
        /// Input CSV file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated target columns (default: all)
        #[arg(short, long)]
        columns: Option<String>,

        /// Strip leading zeroes
        #[arg(long)]
        strip_leading_zeroes: bool,

        /// Left pad with a character to a width, eg `0,6`
        #[arg(long)]
        left_pad: Option<String>,

        /// Strip quotation marks from cells
        #[arg(long)]
        unquote: bool,

        /// Replace all commas with full stops
        #[arg(long)]
        commas_to_points: bool,

        /// Replace blank cells with this value
        #[arg(long)]
        add_missing: Option<String>,

        /// Replace cells equal to X with Y, as `X,Y` tuples
        #[arg(long)]
        replace_cell: Option<String>,

        /// Replace cells equal to X with the value of column Y,
        /// as `X,Y` tuples
        #[arg(long)]
        replace_cell_lookup: Option<String>,

        /// Replace occurrences of character X with Y, as `X,Y` tuples
        #[arg(long)]
        replace_char: Option<String>,

        /// New name for the single target column
        #[arg(long)]
        rename: Option<String>,

        /// Split the target columns on this delimiter
        #[arg(long)]
        split: Option<String>,

        /// Copy the target columns
        #[arg(long)]
        copy: bool,

        /// Drop the target columns
        #[arg(long)]
        drop: bool,

        /// Remove all alphabetic characters
        #[arg(long)]
        stomp_alphas: bool,

        /// Delete rows where a target cell equals this value
        #[arg(long)]
        delete_where: Option<String>,

        /// Delete rows where a target cell does not equal this value
        #[arg(long)]
        delete_where_not: Option<String>,

        /// Trim leading and trailing whitespace
        #[arg(long)]
        trim_whitespace: bool,

        /// Move a trailing marker character to the front
        #[arg(long)]
        back_to_front: Option<String>,

        /// Re-format dates, as `INPUT,OUTPUT` in YYYY/MM/DD tokens
        #[arg(long)]
        reformat_date: Option<String>,

        /// Re-format times, as `INPUT,OUTPUT` in HH/MM/SS tokens
        #[arg(long)]
        reformat_time: Option<String>,

        /// Replace dots, dashes and spaces in headers with underscores
        #[arg(long)]
        clean_cols: bool,
    },

    /// Dump the input's header as a schema
    Schema {
        /// Input CSV file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (kv or json)
        #[arg(short, long, default_value = "kv")]
        format: String,
    },

    /// Union every CSV file in a directory onto one header
    Union {
        /// Directory to read source CSVs from
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Join stdin against a second table on a key column
    Join {
        /// File containing the left hand side of the join
        #[arg(short, long)]
        left: PathBuf,

        /// Column on which to join
        #[arg(short, long, default_value = "id")]
        join_key: String,

        /// Right hand side CSV file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Concatenate source columns into destination columns
    Concat {
        /// CSV file of targets: dest, colon-separated sources, sep
        #[arg(short, long)]
        targets: PathBuf,

        /// Input CSV file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Shuffle the named columns to the start of the file
    Front {
        /// Comma-separated columns to move to the front
        #[arg(short, long)]
        columns: String,

        /// Input CSV file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert an alternate delimiter to standard CSV
    Convert {
        /// The delimiter currently used by the input data
        /// (a single character, or the word `tab`)
        #[arg(short, long)]
        delimiter: String,

        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> stitch_core::Result<()> {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Fold {
            input,
            output,
            group_by,
            match_specs,
            rules,
            flag_column,
        } => cmd_fold(input, output, group_by, &match_specs, rules, flag_column, quiet),
        Commands::Scrub {
            input,
            output,
            columns,
            strip_leading_zeroes,
            left_pad,
            unquote,
            commas_to_points,
            add_missing,
            replace_cell,
            replace_cell_lookup,
            replace_char,
            rename,
            split,
            copy,
            drop,
            stomp_alphas,
            delete_where,
            delete_where_not,
            trim_whitespace,
            back_to_front,
            reformat_date,
            reformat_time,
            clean_cols,
        } => {
            let options = ScrubOptions {
                columns: split_list(columns.as_deref()),
                strip_leading_zeroes,
                left_pad: left_pad.as_deref().map(LeftPad::parse).transpose()?,
                unquote,
                commas_to_points,
                add_missing,
                replace_cell: parse_replacements(replace_cell.as_deref())?,
                replace_cell_lookup: parse_replacements(replace_cell_lookup.as_deref())?,
                replace_char: parse_replacements(replace_char.as_deref())?,
                rename,
                split_on: split,
                copy,
                drop,
                stomp_alphas,
                delete_where,
                delete_where_not,
                trim_whitespace,
                back_to_front,
                reformat_date: reformat_date
                    .as_deref()
                    .map(Reformat::parse_date)
                    .transpose()?,
                reformat_time: reformat_time
                    .as_deref()
                    .map(Reformat::parse_time)
                    .transpose()?,
                clean_headers: clean_cols,
            };
            cmd_scrub(input, output, &options, quiet)
        }
        Commands::Schema { input, output, format } => cmd_schema(input, output, &format),
        Commands::Union { input, output } => cmd_union(&input, output, quiet),
        Commands::Join {
            left,
            join_key,
            input,
            output,
        } => cmd_join(&left, &join_key, input, output, quiet),
        Commands::Concat {
            targets,
            input,
            output,
        } => cmd_concat(&targets, input, output),
        Commands::Front {
            columns,
            input,
            output,
        } => cmd_front(&columns, input, output),
        Commands::Convert {
            delimiter,
            input,
            output,
        } => cmd_convert(&delimiter, input, output),
    }
}

fn open_input(path: Option<PathBuf>) -> stitch_core::Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(&path).map_err(|e| stitch_core::Error::FileRead {
                path,
                source: e,
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

fn open_output(path: Option<PathBuf>) -> stitch_core::Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

fn split_list(input: Option<&str>) -> Vec<String> {
    match input {
        Some(list) if !list.is_empty() => list.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn parse_replacements(input: Option<&str>) -> stitch_core::Result<Vec<Replacement>> {
    match input {
        Some(list) => Replacement::parse_list(list),
        None => Ok(Vec::new()),
    }
}

fn cmd_fold(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    group_by: String,
    match_specs: &[String],
    rules_file: Option<PathBuf>,
    flag_column: String,
    quiet: bool,
) -> stitch_core::Result<()> {
    let mut rules = match rules_file {
        Some(path) => load_rules(path)?,
        None => Vec::new(),
    };
    for spec in match_specs {
        rules.extend(MatchRule::parse_list(spec)?);
    }

    let options = FoldOptions {
        group_by,
        rules,
        flag_column,
    };

    let summary = fold_stream(open_input(input)?, open_output(output)?, &options)?;

    if !quiet {
        eprintln!(
            "Folded {} records into {} across {} groups",
            summary.records_in, summary.records_out, summary.groups
        );
    }

    Ok(())
}

fn cmd_scrub(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    options: &ScrubOptions,
    quiet: bool,
) -> stitch_core::Result<()> {
    let summary = scrub(open_input(input)?, open_output(output)?, options)?;

    if !quiet {
        eprintln!("Scrubbed {} rows, wrote {}", summary.rows_in, summary.rows_out);
    }

    Ok(())
}

fn cmd_schema(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: &str,
) -> stitch_core::Result<()> {
    dump_schema(open_input(input)?, format, open_output(output)?)
}

fn cmd_union(dir: &PathBuf, output: Option<PathBuf>, quiet: bool) -> stitch_core::Result<()> {
    let summary = union_directory(dir, open_output(output)?)?;

    if !quiet {
        eprintln!("Unioned {} files, {} rows:", summary.files.len(), summary.rows);
        for file in &summary.files {
            eprintln!("  {}", file.display());
        }
    }

    Ok(())
}

fn cmd_join(
    left: &PathBuf,
    join_key: &str,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    quiet: bool,
) -> stitch_core::Result<()> {
    let left_file = File::open(left).map_err(|e| stitch_core::Error::FileRead {
        path: left.clone(),
        source: e,
    })?;

    let summary = join(
        join_key,
        BufReader::new(left_file),
        open_input(input)?,
        open_output(output)?,
    )?;

    if !quiet {
        eprintln!("Joined {} rows, {} matched", summary.rows, summary.matched);
    }

    Ok(())
}

fn cmd_concat(
    targets: &PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> stitch_core::Result<()> {
    let targets = load_targets(targets)?;
    concat(open_input(input)?, &targets, open_output(output)?)
}

fn cmd_front(
    columns: &str,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> stitch_core::Result<()> {
    let columns: Vec<String> = columns.split(',').map(str::to_string).collect();
    move_to_front(open_input(input)?, &columns, open_output(output)?)
}

fn cmd_convert(
    delimiter: &str,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> stitch_core::Result<()> {
    let delimiter = match delimiter {
        "tab" => b'\t',
        single if single.len() == 1 => single.as_bytes()[0],
        other => {
            return Err(stitch_core::Error::InvalidOptions(format!(
                "delimiter '{other}' must be a single character or 'tab'"
            )));
        }
    };

    convert_delimiter(open_input(input)?, delimiter, open_output(output)?)
}
