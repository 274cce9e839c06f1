//! Resolution of schema declarations into layouts.
//!
//! Types are resolved in declaration order. A reference names either a
//! built-in scalar (`UInt16`, `Int32BE`, ...) or a type declared earlier in
//! the same file, so every schema is acyclic by construction.

use std::path::{Path, PathBuf};

use strata_core::{
    ArrayType, Codec, Layout, ScalarType, SizedArrayType, SizedObjectType, StructureType,
};
use tracing::debug;

use crate::declaration::{allowed_parameters, DimDecl, SchemaFile, Settings, TypeDecl, TypeKind};
use crate::error::{Result, SchemaError};

/// File name searched for by [`Schema::find_and_load`].
pub const SCHEMA_FILE: &str = "strata.toml";

/// A resolved set of named layouts.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    settings: Settings,
    types: Vec<(String, Layout)>,
}

impl Schema {
    /// Resolve a schema from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let file: SchemaFile = toml::from_str(input)?;
        Self::resolve(file)
    }

    /// Resolve a schema from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Search `start_dir` and its ancestors for a `strata.toml`.
    ///
    /// Returns the schema and the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(SCHEMA_FILE);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found schema");
                return Ok(Some((Self::load(&candidate)?, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Resolve already-parsed declarations.
    pub fn resolve(file: SchemaFile) -> Result<Self> {
        let mut schema = Schema {
            settings: file.settings,
            types: Vec::with_capacity(file.types.len()),
        };
        for decl in &file.types {
            if schema.declared(&decl.name).is_some() || schema.scalar(&decl.name).is_some() {
                return Err(SchemaError::DuplicateType {
                    name: decl.name.clone(),
                });
            }
            let layout = schema.resolve_decl(decl)?;
            debug!(name = %decl.name, family = layout.family(), "resolved type");
            schema.types.push((decl.name.clone(), layout));
        }
        Ok(schema)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Names of the declared types, in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|(name, _)| name.as_str())
    }

    /// Declared types with their layouts, in declaration order.
    pub fn types(&self) -> &[(String, Layout)] {
        &self.types
    }

    /// Look up a declared type or a built-in scalar.
    pub fn layout(&self, name: &str) -> Result<Layout> {
        self.declared(name)
            .cloned()
            .or_else(|| self.scalar(name))
            .ok_or_else(|| SchemaError::NotFound {
                name: name.to_string(),
            })
    }

    fn declared(&self, name: &str) -> Option<&Layout> {
        self.types
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, layout)| layout)
    }

    fn scalar(&self, name: &str) -> Option<Layout> {
        ScalarType::parse(name, self.settings.endian).map(Layout::Scalar)
    }

    fn reference(&self, decl: &TypeDecl, name: &str) -> Result<Layout> {
        self.layout(name).map_err(|_| SchemaError::UnknownType {
            name: decl.name.clone(),
            reference: name.to_string(),
        })
    }

    fn optional_reference(&self, decl: &TypeDecl, name: Option<&String>) -> Result<Option<Layout>> {
        name.map(|n| self.reference(decl, n)).transpose()
    }

    fn resolve_decl(&self, decl: &TypeDecl) -> Result<Layout> {
        let base = self.optional_reference(decl, decl.extends.as_ref())?;
        let kind = match (&base, decl.kind) {
            (Some(base), declared) => {
                let inherited = family_kind(base).ok_or_else(|| invalid(decl, "cannot extend a scalar"))?;
                if declared.is_some_and(|k| k != inherited) {
                    return Err(invalid(
                        decl,
                        format!("kind does not match the {} it extends", inherited.name()),
                    ));
                }
                inherited
            }
            (None, Some(kind)) => kind,
            (None, None) => return Err(invalid(decl, "needs a kind or an extends")),
        };

        let allowed = allowed_parameters(kind);
        let stray: Vec<&str> = decl
            .parameters()
            .into_iter()
            .filter(|p| !allowed.contains(p))
            .collect();
        if !stray.is_empty() {
            return Err(invalid(
                decl,
                format!("parameters not used by {}: {}", kind.name(), stray.join(", ")),
            ));
        }

        let layout = match kind {
            TypeKind::Array => self.resolve_array(decl, base.as_ref())?,
            TypeKind::Structure => self.resolve_structure(decl, base.as_ref())?,
            TypeKind::SizedArray => self.resolve_sized_array(decl, base.as_ref())?,
            TypeKind::SizedObject => self.resolve_sized_object(decl, base.as_ref())?,
        };
        Ok(layout)
    }

    fn resolve_array(&self, decl: &TypeDecl, base: Option<&Layout>) -> Result<Layout> {
        let base = match base {
            Some(Layout::Array(a)) => Some(a),
            _ => None,
        };
        let item = match (self.optional_reference(decl, decl.item.as_ref())?, base) {
            (Some(item), _) => item,
            (None, Some(b)) => b.item().clone(),
            (None, None) => return Err(invalid(decl, "arrays need an item")),
        };
        let dims = match (&decl.dims, base) {
            (Some(dims), _) => dims
                .iter()
                .map(|d| match d {
                    DimDecl::Fixed(n) => Ok(Some(*n)),
                    DimDecl::Open(s) if s == "*" => Ok(None),
                    DimDecl::Open(s) => Err(invalid(
                        decl,
                        format!("dimension `{s}` is neither a length nor \"*\""),
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            (None, Some(b)) => b.dims().to_vec(),
            (None, None) => return Err(invalid(decl, "arrays need dims")),
        };
        Ok(Layout::from(ArrayType::new(item, dims)?.named(&decl.name)))
    }

    fn resolve_structure(&self, decl: &TypeDecl, base: Option<&Layout>) -> Result<Layout> {
        let mut builder = match base {
            Some(Layout::Structure(s)) => StructureType::extend(s, &decl.name),
            _ => StructureType::builder(&decl.name),
        };
        for rename in decl.rename.iter().flatten() {
            builder = builder.rename(&rename.from, &rename.to);
        }
        for member in decl.members.iter().flatten() {
            let layout = self.reference(decl, &member.type_name)?;
            let exists = match base {
                Some(Layout::Structure(s)) => {
                    let renamed = decl
                        .rename
                        .iter()
                        .flatten()
                        .any(|r| r.to == member.name);
                    renamed || s.member(&member.name).is_some()
                }
                _ => false,
            };
            builder = if exists {
                builder.retype(&member.name, layout)
            } else {
                builder.member(&member.name, layout)
            };
        }
        Ok(Layout::from(builder.build()?))
    }

    fn resolve_sized_array(&self, decl: &TypeDecl, base: Option<&Layout>) -> Result<Layout> {
        let mut builder = match base {
            Some(Layout::SizedArray(s)) => SizedArrayType::extend(s, &decl.name),
            _ => SizedArrayType::builder(&decl.name),
        };
        if let Some(name) = &decl.dims_name {
            builder = builder.dims_name(name);
        }
        if let Some(layout) = self.optional_reference(decl, decl.dims_type.as_ref())? {
            builder = builder.dims_layout(layout);
        }
        if let Some(name) = &decl.array_name {
            builder = builder.array_name(name);
        }
        if let Some(item) = self.optional_reference(decl, decl.item.as_ref())? {
            builder = builder.item(item);
        }
        if let Some(ndim) = decl.ndim {
            builder = builder.ndim(ndim);
        }
        Ok(Layout::from(builder.build()?))
    }

    fn resolve_sized_object(&self, decl: &TypeDecl, base: Option<&Layout>) -> Result<Layout> {
        let mut builder = match base {
            Some(Layout::SizedObject(s)) => SizedObjectType::extend(s, &decl.name),
            _ => SizedObjectType::builder(&decl.name),
        };
        if let Some(name) = &decl.size_name {
            builder = builder.size_name(name);
        }
        if let Some(layout) = self.optional_reference(decl, decl.size_type.as_ref())? {
            builder = builder.size_layout(layout);
        }
        if let Some(factor) = decl.factor {
            builder = builder.factor(factor);
        }
        if let Some(name) = &decl.item_name {
            builder = builder.item_name(name);
        }
        if let Some(item) = self.optional_reference(decl, decl.item.as_ref())? {
            builder = builder.item_layout(item);
        }
        Ok(Layout::from(builder.build()?))
    }
}

fn family_kind(layout: &Layout) -> Option<TypeKind> {
    match layout {
        Layout::Scalar(_) => None,
        Layout::Array(_) => Some(TypeKind::Array),
        Layout::Structure(_) => Some(TypeKind::Structure),
        Layout::SizedArray(_) => Some(TypeKind::SizedArray),
        Layout::SizedObject(_) => Some(TypeKind::SizedObject),
    }
}

fn invalid(decl: &TypeDecl, detail: impl Into<String>) -> SchemaError {
    SchemaError::InvalidType {
        name: decl.name.clone(),
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_core::{pack, unpack, Endian, LayoutError};

    const SCHEMA: &str = r#"
[[types]]
name = "Matrix"
kind = "array"
item = "UInt16"
dims = [2, 2]

[[types]]
name = "Samples"
kind = "sized-array"
dims-name = "count"
dims-type = "UInt8"
array-name = "array"
item = "UInt16"
ndim = 1

[[types]]
name = "Rows"
kind = "array"
item = "UInt8"
dims = ["*"]

[[types]]
name = "Blob"
kind = "sized-object"
size-type = "UInt8"
factor = 2
item = "Rows"
"#;

    fn resolved() -> Schema {
        Schema::parse(SCHEMA).unwrap()
    }

    #[test]
    fn forward_references_are_rejected() {
        let input = "[[types]]\nname = \"Blob\"\nkind = \"sized-object\"\nsize-type = \"UInt8\"\nitem = \"Rows\"\n";
        let err = Schema::parse(input).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownType { ref name, ref reference } if name == "Blob" && reference == "Rows"
        ));
    }

    #[test]
    fn resolves_in_declaration_order() {
        let schema = resolved();
        let names: Vec<&str> = schema.type_names().collect();
        assert_eq!(names, ["Matrix", "Samples", "Rows", "Blob"]);

        let matrix = schema.layout("Matrix").unwrap();
        assert_eq!(matrix.type_name(), "Matrix");
        let value = matrix.build(&json!([[0, 1], [256, 257]])).unwrap();
        assert_eq!(pack(&matrix, &value).unwrap(), [0, 0, 1, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn builtin_scalars_follow_default_endian() {
        let schema = Schema::parse("[settings]\nendian = \"big\"\n").unwrap();
        assert_eq!(schema.settings().endian, Endian::Big);
        assert_eq!(schema.layout("UInt16").unwrap().type_name(), "UInt16BE");
        assert_eq!(schema.layout("UInt16LE").unwrap().type_name(), "UInt16");
        assert!(matches!(
            schema.layout("Nope"),
            Err(SchemaError::NotFound { .. })
        ));
    }

    #[test]
    fn sized_object_from_schema() {
        let schema = resolved();
        let blob = schema.layout("Blob").unwrap();
        let value = unpack(&blob, &[2, 1, 2, 3, 4]).unwrap();
        assert_eq!(value, json!({"size": 2, "item": [1, 2, 3, 4]}));
    }

    #[test]
    fn extends_overrides_parameters() {
        let input = format!(
            "{}\n{}",
            SCHEMA,
            r#"
[[types]]
name = "WideSamples"
extends = "Samples"
dims-type = "UInt32"

[[types]]
name = "Header"
kind = "structure"
members = [{ name = "magic", type = "UInt32" }, { name = "body", type = "Matrix" }]

[[types]]
name = "TaggedHeader"
extends = "Header"
rename = [{ from = "magic", to = "tag" }]
members = [{ name = "tag", type = "UInt8" }, { name = "crc", type = "UInt16" }]
"#
        );
        let schema = Schema::parse(&input).unwrap();

        let wide = schema.layout("WideSamples").unwrap();
        let value = wide.build(&json!([7])).unwrap();
        assert_eq!(pack(&wide, &value).unwrap(), [1, 0, 0, 0, 7, 0]);

        let Layout::Structure(tagged) = schema.layout("TaggedHeader").unwrap() else {
            panic!("expected a structure");
        };
        let names: Vec<&str> = tagged.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["tag", "body", "crc"]);
        assert_eq!(tagged.calcsize().unwrap(), 1 + 8 + 2);
    }

    #[test]
    fn invalid_declarations_name_the_type() {
        let err = Schema::parse("[[types]]\nname = \"T\"\nkind = \"array\"\nitem = \"UInt8\"\n").unwrap_err();
        assert_eq!(err.to_string(), "invalid type `T`: arrays need dims");

        let err = Schema::parse(
            "[[types]]\nname = \"T\"\nkind = \"array\"\nitem = \"UInt8\"\ndims = [1]\nfactor = 2\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("parameters not used by array: factor"));

        let err = Schema::parse("[[types]]\nname = \"UInt8\"\nkind = \"array\"\nitem = \"UInt8\"\ndims = [1]\n")
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateType { .. }));

        let err = Schema::parse(
            "[[types]]\nname = \"S\"\nkind = \"sized-object\"\nsize-type = \"UInt8\"\nfactor = 0\nitem = \"UInt8\"\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::Layout(LayoutError::Construction { .. })
        ));
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SCHEMA_FILE), SCHEMA).unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (schema, found) = Schema::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert!(schema.layout("Samples").is_ok());
    }

    #[test]
    fn find_and_load_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SCHEMA_FILE), "[[types]]\nname = 1\n").unwrap();
        assert!(matches!(
            Schema::find_and_load(dir.path()),
            Err(SchemaError::Toml(_))
        ));
    }
}
