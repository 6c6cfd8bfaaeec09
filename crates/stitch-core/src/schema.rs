//! Schema dump for a CSV header
//!
//! Every column is STRING; there is no type inference beyond the first
//! header row.

use crate::error::{Error, Result};
use crate::reader::RecordReader;
use serde::Serialize;
use std::io::{Read, Write};

/// One column definition in the JSON schema output
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Dump the input's header as a schema.
///
/// `kv` writes `name:STRING` pairs on one comma-separated line; `json`
/// writes an array of `{name, type}` objects.
pub fn dump_schema<R: Read, W: Write>(input: R, format: &str, mut output: W) -> Result<()> {
    let reader = RecordReader::new(input)?;
    let names = reader.header().names();

    match format {
        "kv" => {
            writeln!(output, "{}:STRING", names.join(":STRING,"))?;
        }
        "json" => {
            let schema: Vec<ColumnDef> = names
                .iter()
                .map(|name| ColumnDef {
                    name: name.clone(),
                    column_type: "STRING".to_string(),
                })
                .collect();

            serde_json::to_writer(&mut output, &schema)?;
            writeln!(output)?;
        }
        other => {
            return Err(Error::InvalidOptions(format!(
                "invalid schema format '{other}', expected kv or json"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_schema() {
        let mut out = Vec::new();
        dump_schema("id,start,end\none,9am,5pm\n".as_bytes(), "kv", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id:STRING,start:STRING,end:STRING\n"
        );
    }

    #[test]
    fn test_json_schema() {
        let mut out = Vec::new();
        dump_schema("id,start\none,9am\n".as_bytes(), "json", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[{\"name\":\"id\",\"type\":\"STRING\"},{\"name\":\"start\",\"type\":\"STRING\"}]\n"
        );
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        assert!(dump_schema("id\n1\n".as_bytes(), "yaml", Vec::new()).is_err());
    }
}
