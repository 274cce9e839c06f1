//! Dump view: one table row per decoded field.

use serde_json::json;
use strata_core::{Dump, DumpValue, LayoutError};

use crate::error::Result;
use crate::format::{format_access, format_dump_value, format_octets, format_offset, DEFAULT_HEX_WIDTH};
use crate::view::ViewOutput;

const HEADERS: [&str; 5] = ["Offset", "Access", "Value", "Bytes", "Type"];

/// Renders a [`Dump`] as a box-drawn table and a JSON document.
#[derive(Debug, Clone, Copy)]
pub struct DumpTable {
    /// Bytes shown per Bytes cell before truncating.
    pub hex_width: usize,
}

impl Default for DumpTable {
    fn default() -> Self {
        Self {
            hex_width: DEFAULT_HEX_WIDTH,
        }
    }
}

impl DumpTable {
    pub fn new(hex_width: usize) -> Self {
        Self { hex_width }
    }

    /// Render every record of `dump`.
    pub fn render(&self, dump: &Dump) -> Result<ViewOutput> {
        let failure = dump.failure().map(|r| r.path.to_string());
        let data = json!({
            "view": "dump",
            "root": dump.root(),
            "records": serde_json::to_value(dump.records())?,
            "failure": failure,
            "total": dump.len(),
        });

        if dump.is_empty() {
            return Ok(ViewOutput {
                text: "No fields were decoded.\n".to_string(),
                data,
            });
        }

        let rows: Vec<[String; 5]> = dump
            .iter()
            .map(|r| {
                [
                    format_offset(r.offset),
                    format_access(&r.path),
                    format_dump_value(&r.value),
                    format_octets(&r.bytes, self.hex_width),
                    r.type_name.clone(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(|h| h.chars().count());
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut text = String::new();
        text.push_str("=== Dump ===\n\n");
        text.push_str(&rule('┌', '┬', '┐', &widths));
        text.push_str(&line(&HEADERS.map(String::from), &widths));
        text.push_str(&rule('├', '┼', '┤', &widths));
        for row in &rows {
            text.push_str(&line(row, &widths));
        }
        text.push_str(&rule('└', '┴', '┘', &widths));

        let marked = dump
            .iter()
            .filter(|r| !matches!(r.value, DumpValue::Decoded(_) | DumpValue::Composite))
            .count();
        text.push_str(&format!("\n{} fields, {} flagged\n", dump.len(), marked));

        Ok(ViewOutput { text, data })
    }

    /// Render a layout error together with its dump, if it carries one.
    pub fn render_error(&self, err: &LayoutError) -> Result<ViewOutput> {
        let mut text = format!("error: {err}\n");
        let mut data = json!({ "error": err.to_string() });
        if let Some(dump) = err.dump() {
            if let Some(failure) = dump.failure() {
                text.push_str(&format!(
                    "  at {} ({}, offset {})\n",
                    failure.path,
                    failure.type_name,
                    format_offset(failure.offset)
                ));
            }
            text.push('\n');
            let table = self.render(dump)?;
            text.push_str(&table.text);
            data["dump"] = table.data;
        }
        Ok(ViewOutput { text, data })
    }
}

fn rule(left: char, mid: char, right: char, widths: &[usize; 5]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(mid.to_string().as_str()))
}

fn line(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!(" {cell:<w$} "))
        .collect();
    format!("│{}│\n", padded.join("│"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{unpack, ArrayType, Layout};

    fn matrix() -> Layout {
        Layout::from(ArrayType::fixed(Layout::uint16(), &[2, 2]).unwrap())
    }

    #[test]
    fn table_lists_failure_row() {
        let err = unpack(&matrix(), &[0, 0, 1, 0, 0, 1, 1]).unwrap_err();
        let output = DumpTable::default().render(err.dump().unwrap()).unwrap();
        assert!(output.text.contains("│ Offset │"));
        assert!(output.text.contains("x[1][1]"));
        assert!(output.text.contains("<1 bytes short>"));
        assert!(output.text.contains("UInt16[2][2]"));
        assert_eq!(output.data["failure"], "x[1][1]");
        assert_eq!(output.data["total"], 7);
    }

    #[test]
    fn rows_are_aligned() {
        let err = unpack(&matrix(), &[0, 0, 1, 0, 0, 1, 1, 1, 0x99]).unwrap_err();
        let output = DumpTable::default().render(err.dump().unwrap()).unwrap();
        let widths: Vec<usize> = output
            .text
            .lines()
            .filter(|l| l.starts_with('│') || l.starts_with('┌'))
            .map(|l| l.chars().count())
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
        assert!(output.text.contains("<unconsumed>"));
    }

    #[test]
    fn error_report_names_location() {
        let err = unpack(&matrix(), &[0, 0, 1]).unwrap_err();
        let output = DumpTable::new(4).render_error(&err).unwrap();
        assert!(output.text.starts_with("error: 1 too few bytes to unpack"));
        assert!(output.text.contains("at x[0][1] (UInt16, offset 0x0002)"));
        assert_eq!(output.data["dump"]["failure"], "x[0][1]");
    }

    #[test]
    fn empty_dump() {
        let output = DumpTable::default().render(&Dump::new()).unwrap();
        assert_eq!(output.text, "No fields were decoded.\n");
        assert_eq!(output.data["total"], 0);
    }
}
