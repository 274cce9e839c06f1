//! `strata size` — static size of a layout.

use anyhow::Result;
use strata_core::{calcsize, LayoutError};
use strata_schema::Schema;

/// One-line size description.
pub fn describe(schema: &Schema, type_name: &str) -> Result<String> {
    let layout = schema.layout(type_name)?;
    match calcsize(&layout) {
        Ok(n) => Ok(format!("{type_name}: {n} bytes")),
        Err(LayoutError::Size { reason, .. }) => Ok(format!("{type_name}: variable ({reason})")),
        Err(e) => Err(e.into()),
    }
}

pub fn run(schema: &Schema, type_name: &str) -> Result<()> {
    println!("{}", describe(schema, type_name)?);
    Ok(())
}
