//! Shared formatting helpers for dump views.

use strata_core::{AccessPath, DumpValue};

/// Default number of bytes shown per cell.
pub const DEFAULT_HEX_WIDTH: usize = 16;

/// Format bytes as space-separated hex, showing at most `max` of them.
///
/// Example output: `00 01 02 ... (5 more)`
pub fn format_octets(octets: &[u8], max: usize) -> String {
    let shown: Vec<String> = octets.iter().take(max).map(|b| format!("{b:02x}")).collect();
    let mut text = shown.join(" ");
    if octets.len() > max {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&format!("... ({} more)", octets.len() - max));
    }
    text
}

/// Format a buffer offset.
pub fn format_offset(offset: usize) -> String {
    format!("{offset:#06x}")
}

/// Access path indented by nesting depth.
pub fn format_access(path: &AccessPath) -> String {
    format!("{}{path}", "  ".repeat(path.depth()))
}

/// Text for the value column of a dump record.
pub fn format_dump_value(value: &DumpValue) -> String {
    match value {
        DumpValue::Decoded(v) => v.to_string(),
        DumpValue::Composite => String::new(),
        DumpValue::Insufficient { shortfall } => format!("<{shortfall} bytes short>"),
        DumpValue::Excess => "<unconsumed>".to_string(),
    }
}
