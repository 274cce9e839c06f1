//! `strata unpack` — decode bytes into a value.

use std::fs;

use anyhow::{Context, Result};
use serde_json::json;
use strata_core::{unpack_and_dump_rooted, Dump, LayoutError, Value};
use strata_observe::{DumpTable, ViewFormat};
use strata_schema::Schema;

use crate::hex;

/// Bytes from `--hex` text or an `--input` file.
fn read_input(hex_text: Option<&str>, input: Option<&str>) -> Result<Vec<u8>> {
    match (hex_text, input) {
        (Some(text), _) => hex::parse(text).context("parsing --hex"),
        (None, Some(path)) => fs::read(path).with_context(|| format!("reading {path}")),
        (None, None) => anyhow::bail!("no input bytes: pass --hex or --input"),
    }
}

/// Render a decoded value, with the dump table when one is given.
pub fn render_value(
    type_name: &str,
    value: &Value,
    dump: Option<&Dump>,
    table: DumpTable,
    format: ViewFormat,
) -> Result<String> {
    let json_value = value.to_json();
    match format {
        ViewFormat::Text => {
            let mut text = serde_json::to_string_pretty(&json_value)?;
            text.push('\n');
            if let Some(dump) = dump {
                text.push('\n');
                text.push_str(&table.render(dump)?.text);
            }
            Ok(text)
        }
        ViewFormat::Json => {
            let mut data = json!({ "type": type_name, "value": json_value });
            if let Some(dump) = dump {
                data["dump"] = table.render(dump)?.data;
            }
            Ok(format!("{}\n", serde_json::to_string_pretty(&data)?))
        }
    }
}

/// Render a decode failure: where it stopped, then the dump it carries.
pub fn render_failure(err: &LayoutError, table: DumpTable, format: ViewFormat) -> Result<String> {
    let output = table.render_error(err)?;
    Ok(match format {
        ViewFormat::Text => output.text,
        ViewFormat::Json => format!("{}\n", output.render(format)),
    })
}

pub fn run(
    schema: &Schema,
    type_name: &str,
    hex_text: Option<&str>,
    input: Option<&str>,
    show_dump: bool,
    format: ViewFormat,
) -> Result<()> {
    let layout = schema.layout(type_name)?;
    let bytes = read_input(hex_text, input)?;
    let settings = schema.settings();
    let table = DumpTable::new(settings.hex_width);

    match unpack_and_dump_rooted(&layout, &bytes, Dump::with_root(&settings.dump_root)) {
        Ok((value, dump)) => {
            let dump = show_dump.then_some(&dump);
            print!("{}", render_value(type_name, &value, dump, table, format)?);
            Ok(())
        }
        Err(err) => {
            if err.dump().is_some() {
                print!("{}", render_failure(&err, table, format)?);
            }
            Err(err).with_context(|| format!("unpacking {} bytes as {type_name}", bytes.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{unpack_and_dump, Layout};

    fn matrix() -> Schema {
        Schema::parse(
            r#"
[settings]
dump-root = "m"

[[types]]
name = "Matrix"
kind = "array"
item = "UInt16"
dims = [2, 2]
"#,
        )
        .unwrap()
    }

    #[test]
    fn reads_hex_or_file() {
        assert_eq!(read_input(Some("01 02"), None).unwrap(), vec![1, 2]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.bin");
        fs::write(&path, [7u8, 8]).unwrap();
        assert_eq!(read_input(None, path.to_str()).unwrap(), vec![7, 8]);
        assert!(read_input(None, None).is_err());
    }

    #[test]
    fn text_output_is_pretty_json() {
        let layout = Layout::uint16();
        let (value, dump) = unpack_and_dump(&layout, &[1, 1]).unwrap();
        let text =
            render_value("UInt16", &value, Some(&dump), DumpTable::default(), ViewFormat::Text)
                .unwrap();
        assert!(text.starts_with("257\n\n=== Dump ===\n"));
    }

    #[test]
    fn json_output_carries_type_and_dump() {
        let layout = Layout::uint16();
        let (value, dump) = unpack_and_dump(&layout, &[1, 0]).unwrap();
        let text =
            render_value("UInt16", &value, Some(&dump), DumpTable::default(), ViewFormat::Json)
                .unwrap();
        let data: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(data["type"], "UInt16");
        assert_eq!(data["value"], 1);
        assert_eq!(data["dump"]["total"], 1);
    }

    #[test]
    fn failure_uses_schema_root() {
        let schema = matrix();
        let err = run(&schema, "Matrix", Some("0000 0100 0001 01"), None, false, ViewFormat::Text)
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("unpacking 7 bytes as Matrix"));

        let layout = schema.layout("Matrix").unwrap();
        let err = unpack_and_dump_rooted(&layout, &[0, 0, 1, 0, 0, 1, 1], Dump::with_root("m"))
            .unwrap_err();
        let text = render_failure(&err, DumpTable::default(), ViewFormat::Text).unwrap();
        assert!(text.starts_with("error: 1 too few bytes to unpack\n  at m[1][1] (UInt16, offset 0x0006)\n"));
        assert!(text.contains("=== Dump ==="));
    }

    #[test]
    fn failure_json_carries_error_and_dump() {
        let layout = matrix().layout("Matrix").unwrap();
        let err = unpack_and_dump_rooted(&layout, &[0, 0, 1], Dump::with_root("m")).unwrap_err();
        let text = render_failure(&err, DumpTable::default(), ViewFormat::Json).unwrap();
        let data: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(data["error"], "1 too few bytes to unpack");
        assert_eq!(data["dump"]["failure"], "m[0][1]");
    }
}
