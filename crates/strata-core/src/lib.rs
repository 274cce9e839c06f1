//! Typed binary layouts for the Strata toolkit.
//!
//! Declares structured records and converts losslessly between typed values
//! and raw byte buffers, with a per-field dump of how far a decode got when a
//! buffer is malformed.
//!
//! ## Modules
//!
//! - [`memory`] — Byte cursor with scoped, nested byte budgets
//! - [`dump`] — Per-field decode diary keyed by access path
//! - [`codec`] — The codec contract and top-level `pack` / `unpack`
//! - [`scalar`] — Fixed-width integer and float leaves
//! - [`array`] — Multi-dimensional arrays with open dimensions
//! - [`structure`] — Named-member structures and their type-builder
//! - [`sized_array`] — Arrays whose shape is read from a count member
//! - [`sized_object`] — Items bounded by a size member
//! - [`value`] — Values, array views and structure values
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use strata_core::{pack, unpack, ArrayType, Codec, Layout};
//!
//! let matrix = Layout::from(ArrayType::fixed(Layout::uint16(), &[2, 2]).unwrap());
//! let value = matrix.build(&json!([[0, 1], [256, 257]])).unwrap();
//! let bytes = pack(&matrix, &value).unwrap();
//! assert_eq!(bytes, [0, 0, 1, 0, 0, 1, 1, 1]);
//! assert_eq!(unpack(&matrix, &bytes).unwrap(), value);
//! ```

pub mod array;
pub mod codec;
pub mod dump;
pub mod error;
pub mod layout;
pub mod memory;
pub mod scalar;
pub mod sized_array;
pub mod sized_object;
pub mod structure;
pub mod value;

pub use array::ArrayType;
pub use codec::{calcsize, nbytes, pack, pack_and_dump, unpack, unpack_and_dump, unpack_and_dump_rooted, Codec};
pub use dump::{AccessPath, Dump, DumpRecord, DumpValue, PathSegment, DEFAULT_ROOT};
pub use error::{LayoutError, Result};
pub use layout::Layout;
pub use memory::{LimitGuard, MemoryView};
pub use scalar::{Endian, ScalarKind, ScalarType};
pub use sized_array::{SizedArrayBuilder, SizedArrayType};
pub use sized_object::{SizedObjectBuilder, SizedObjectType};
pub use structure::{Member, StructureBuilder, StructureType};
pub use value::{ArrayValue, ArrayView, Element, StructKind, StructValue, Value};
