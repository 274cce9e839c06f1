//! `strata types` — list available layouts.

use anyhow::Result;
use strata_core::{Codec, ScalarKind};
use strata_schema::Schema;

/// Table of declared types followed by the built-in scalar names.
pub fn listing(schema: &Schema) -> String {
    let mut text = String::new();
    let types = schema.types();
    if types.is_empty() {
        text.push_str("No declared types.\n");
    } else {
        let name_w = types.iter().map(|(n, _)| n.len()).max().unwrap_or(4).max(4);
        text.push_str(&format!("{:<name_w$}  {:<12}  Size\n", "Name", "Kind"));
        for (name, layout) in types {
            let size = layout
                .calcsize()
                .map(|n| format!("{n} bytes"))
                .unwrap_or_else(|_| "variable".to_string());
            text.push_str(&format!("{name:<name_w$}  {:<12}  {size}\n", layout.family()));
        }
    }

    let scalars: Vec<&str> = ScalarKind::ALL.iter().map(|k| k.name()).collect();
    text.push_str(&format!(
        "\nBuilt-in scalars ({} default, BE/LE suffix to override):\n  {}\n",
        match schema.settings().endian {
            strata_core::Endian::Little => "little-endian",
            strata_core::Endian::Big => "big-endian",
        },
        scalars.join(", ")
    ));
    text
}

pub fn run(schema: &Schema) -> Result<()> {
    print!("{}", listing(schema));
    Ok(())
}
