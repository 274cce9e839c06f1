//! Declarative layout schemas for Strata.
//!
//! A `strata.toml` file names layouts and their parameters; this crate
//! resolves those declarations into [`strata_core::Layout`] values through
//! the same builders the core exposes, including `extends` for deriving a
//! new type from an earlier one.
//!
//! ## Modules
//!
//! - [`declaration`] — `strata.toml` file structure
//! - [`schema`] — Resolution of declarations into layouts

pub mod declaration;
pub mod error;
pub mod schema;

pub use declaration::{DimDecl, MemberDecl, RenameDecl, SchemaFile, Settings, TypeDecl, TypeKind};
pub use error::SchemaError;
pub use schema::{Schema, SCHEMA_FILE};
