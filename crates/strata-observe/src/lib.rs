//! Human observability layer for Strata.
//!
//! Renders decode dumps as terminal tables and JSON documents, so a
//! malformed buffer can be read field by field.

pub mod dump_table;
pub mod error;
pub mod format;
pub mod view;

pub use dump_table::DumpTable;
pub use error::ObserveError;
pub use format::{format_access, format_dump_value, format_octets, format_offset, DEFAULT_HEX_WIDTH};
pub use view::{ViewFormat, ViewOutput};
