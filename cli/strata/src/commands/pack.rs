//! `strata pack` — encode a JSON value.

use std::fs;

use anyhow::{Context, Result};
use strata_core::{pack, unpack_and_dump_rooted, Codec, Dump};
use strata_observe::DumpTable;
use strata_schema::Schema;

use crate::hex;

/// Build `value` (JSON text) as `type_name` and return its bytes.
pub fn encode(schema: &Schema, type_name: &str, value: &str) -> Result<Vec<u8>> {
    let layout = schema.layout(type_name)?;
    let data: serde_json::Value =
        serde_json::from_str(value).context("parsing --value as JSON")?;
    let value = layout
        .build(&data)
        .with_context(|| format!("building {type_name}"))?;
    Ok(pack(&layout, &value)?)
}

pub fn run(
    schema: &Schema,
    type_name: &str,
    value: &str,
    output: Option<&str>,
    show_dump: bool,
) -> Result<()> {
    let bytes = encode(schema, type_name, value)?;

    match output {
        Some(path) => {
            fs::write(path, &bytes).with_context(|| format!("writing {path}"))?;
            println!("Wrote {} bytes to {path}", bytes.len());
        }
        None => println!("{}", hex::encode(&bytes)),
    }

    if show_dump {
        let settings = schema.settings();
        let layout = schema.layout(type_name)?;
        let (_, dump) =
            unpack_and_dump_rooted(&layout, &bytes, Dump::with_root(&settings.dump_root))?;
        println!();
        print!("{}", DumpTable::new(settings.hex_width).render(&dump)?.text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
[[types]]
name = "Matrix"
kind = "array"
item = "UInt16"
dims = [2, 2]
"#;

    #[test]
    fn encodes_declared_type() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let bytes = encode(&schema, "Matrix", "[[0, 1], [256, 257]]").unwrap();
        assert_eq!(hex::encode(&bytes), "0000010000010101");
    }

    #[test]
    fn reports_bad_input() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let err = encode(&schema, "Matrix", "[[0, 1]").unwrap_err();
        assert!(format!("{err:#}").contains("parsing --value as JSON"));
        let err = encode(&schema, "Matrix", "[[0, 1, 2]]").unwrap_err();
        assert!(format!("{err:#}").contains("building Matrix"));
        assert!(encode(&schema, "Missing", "1").is_err());
    }

    #[test]
    fn writes_raw_bytes() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        run(&schema, "UInt16", "258", path.to_str(), false).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![0x02, 0x01]);
    }
}
