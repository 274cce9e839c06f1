//! Schema file (`strata.toml`) declarations.
//!
//! A schema file carries optional `[settings]` and a list of `[[types]]`,
//! each naming a layout family and its parameters. Declarations are plain
//! data here; [`crate::schema`] resolves them into layouts.

use serde::{Deserialize, Serialize};
use strata_core::{Endian, DEFAULT_ROOT};

/// Default number of bytes shown per Bytes cell in dump tables.
pub const DEFAULT_HEX_WIDTH: usize = 16;

/// A complete schema file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

/// Schema-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Byte order of scalar names without a `BE`/`LE` suffix.
    #[serde(default)]
    pub endian: Endian,
    /// Root name of access paths in dumps.
    #[serde(default = "default_dump_root")]
    pub dump_root: String,
    /// Bytes shown per Bytes cell in dump tables.
    #[serde(default = "default_hex_width")]
    pub hex_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endian: Endian::Little,
            dump_root: default_dump_root(),
            hex_width: default_hex_width(),
        }
    }
}

fn default_dump_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_hex_width() -> usize {
    DEFAULT_HEX_WIDTH
}

/// Layout family of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeKind {
    Array,
    Structure,
    SizedArray,
    SizedObject,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Array => "array",
            TypeKind::Structure => "structure",
            TypeKind::SizedArray => "sized-array",
            TypeKind::SizedObject => "sized-object",
        }
    }
}

/// One array dimension: a length, or `"*"` for an open dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimDecl {
    Fixed(usize),
    Open(String),
}

/// A structure member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A member rename applied when extending a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameDecl {
    pub from: String,
    pub to: String,
}

/// A single `[[types]]` entry.
///
/// Which parameters apply depends on the kind; unused ones are rejected
/// during resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: Option<TypeKind>,
    /// Earlier type whose parameters this declaration starts from.
    #[serde(default)]
    pub extends: Option<String>,

    // array, sized-array, sized-object
    #[serde(default)]
    pub item: Option<String>,
    // array
    #[serde(default)]
    pub dims: Option<Vec<DimDecl>>,

    // structure
    #[serde(default)]
    pub members: Option<Vec<MemberDecl>>,
    #[serde(default)]
    pub rename: Option<Vec<RenameDecl>>,

    // sized-array
    #[serde(default)]
    pub dims_name: Option<String>,
    #[serde(default)]
    pub dims_type: Option<String>,
    #[serde(default)]
    pub array_name: Option<String>,
    #[serde(default)]
    pub ndim: Option<usize>,

    // sized-object
    #[serde(default)]
    pub size_name: Option<String>,
    #[serde(default)]
    pub size_type: Option<String>,
    #[serde(default)]
    pub factor: Option<usize>,
    #[serde(default)]
    pub item_name: Option<String>,
}

impl TypeDecl {
    /// Names of the parameters that are set, for checking them against a kind.
    pub(crate) fn parameters(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        let flags = [
            ("item", self.item.is_some()),
            ("dims", self.dims.is_some()),
            ("members", self.members.is_some()),
            ("rename", self.rename.is_some()),
            ("dims-name", self.dims_name.is_some()),
            ("dims-type", self.dims_type.is_some()),
            ("array-name", self.array_name.is_some()),
            ("ndim", self.ndim.is_some()),
            ("size-name", self.size_name.is_some()),
            ("size-type", self.size_type.is_some()),
            ("factor", self.factor.is_some()),
            ("item-name", self.item_name.is_some()),
        ];
        for (name, present) in flags {
            if present {
                set.push(name);
            }
        }
        set
    }
}

/// Parameters each kind accepts.
pub(crate) fn allowed_parameters(kind: TypeKind) -> &'static [&'static str] {
    match kind {
        TypeKind::Array => &["item", "dims"],
        TypeKind::Structure => &["members", "rename"],
        TypeKind::SizedArray => &["dims-name", "dims-type", "array-name", "item", "ndim"],
        TypeKind::SizedObject => &["size-name", "size-type", "factor", "item-name", "item"],
    }
}
