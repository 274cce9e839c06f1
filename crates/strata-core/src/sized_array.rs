//! Count-prefixed arrays.
//!
//! A sized array is a two-member structure: a dims member followed by an
//! array member whose shape is whatever the dims member says. The dims
//! member is an unsigned scalar (one dimension), an unsigned array with one
//! fixed dimension `N`, or a structure of `N` unsigned scalars.

use serde_json::{Map, Value as JsonValue};

use crate::array::ArrayType;
use crate::codec::Codec;
use crate::dump::{nested, Dump, PathSegment};
use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::memory::MemoryView;
use crate::structure::StructureType;
use crate::value::{ArrayValue, StructKind, StructValue, Value};

/// Parameters of a sized array family.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedArrayType {
    name: String,
    dims_name: String,
    dims: Layout,
    array_name: String,
    array: ArrayType,
    inner: StructureType,
}

/// Defines a [`SizedArrayType`].
#[derive(Debug, Clone)]
pub struct SizedArrayBuilder {
    name: String,
    dims_name: String,
    dims: Option<Layout>,
    array_name: String,
    item: Option<Layout>,
    ndim: Option<usize>,
}

impl SizedArrayBuilder {
    /// Name and layout of the dims member.
    pub fn dims(mut self, name: impl Into<String>, layout: Layout) -> Self {
        self.dims_name = name.into();
        self.dims = Some(layout);
        self
    }

    pub fn dims_name(mut self, name: impl Into<String>) -> Self {
        self.dims_name = name.into();
        self
    }

    pub fn dims_layout(mut self, layout: Layout) -> Self {
        self.dims = Some(layout);
        self
    }

    /// Name of the array member and the layout of its items.
    pub fn array(mut self, name: impl Into<String>, item: Layout) -> Self {
        self.array_name = name.into();
        self.item = Some(item);
        self
    }

    pub fn array_name(mut self, name: impl Into<String>) -> Self {
        self.array_name = name.into();
        self
    }

    pub fn item(mut self, item: Layout) -> Self {
        self.item = Some(item);
        self
    }

    /// Expected dimensionality; checked against the dims layout.
    pub fn ndim(mut self, ndim: usize) -> Self {
        self.ndim = Some(ndim);
        self
    }

    pub fn build(self) -> Result<SizedArrayType> {
        let invalid = |message: String| LayoutError::construction(&self.name, message);
        let dims = self
            .dims
            .clone()
            .ok_or_else(|| invalid("no dims member layout given".to_string()))?;
        let item = self
            .item
            .clone()
            .ok_or_else(|| invalid("no array item layout given".to_string()))?;
        let ndim = dims_count(&dims).ok_or_else(|| {
            invalid(format!(
                "dims member {} is not an unsigned scalar, a fixed 1-dimensional unsigned array \
                 or a structure of unsigned scalars",
                dims.type_name()
            ))
        })?;
        if let Some(expected) = self.ndim {
            if expected != ndim {
                return Err(invalid(format!(
                    "dims member {} describes {ndim} dimensions, expected {expected}",
                    dims.type_name()
                )));
            }
        }
        if ndim == 0 {
            return Err(invalid("dims member describes no dimensions".to_string()));
        }
        let array = ArrayType::open(item, ndim)?;
        let inner = StructureType::builder(self.name.clone())
            .member(self.dims_name.clone(), dims.clone())
            .member(self.array_name.clone(), Layout::from(array.clone()))
            .build()?;
        Ok(SizedArrayType {
            name: self.name,
            dims_name: self.dims_name,
            dims,
            array_name: self.array_name,
            array,
            inner,
        })
    }
}

/// Number of dimensions a dims layout describes, if it is a valid one.
fn dims_count(layout: &Layout) -> Option<usize> {
    match layout {
        Layout::Scalar(_) if layout.is_unsigned_scalar() => Some(1),
        Layout::Array(a) if a.item().is_unsigned_scalar() => match a.dims() {
            [Some(n)] => Some(*n),
            _ => None,
        },
        Layout::Structure(s) if s.members().iter().all(|m| m.layout.is_unsigned_scalar()) => {
            Some(s.members().len())
        }
        _ => None,
    }
}

impl SizedArrayType {
    pub fn builder(name: impl Into<String>) -> SizedArrayBuilder {
        SizedArrayBuilder {
            name: name.into(),
            dims_name: "dims".to_string(),
            dims: None,
            array_name: "array".to_string(),
            item: None,
            ndim: None,
        }
    }

    /// Start a new family from the parameters of `base`.
    pub fn extend(base: &SizedArrayType, name: impl Into<String>) -> SizedArrayBuilder {
        SizedArrayBuilder {
            name: name.into(),
            dims_name: base.dims_name.clone(),
            dims: Some(base.dims.clone()),
            array_name: base.array_name.clone(),
            item: Some(base.array.item().clone()),
            ndim: None,
        }
    }

    pub fn dims_name(&self) -> &str {
        &self.dims_name
    }

    pub fn dims_layout(&self) -> &Layout {
        &self.dims
    }

    pub fn array_name(&self) -> &str {
        &self.array_name
    }

    pub fn item(&self) -> &Layout {
        self.array.item()
    }

    pub fn ndim(&self) -> usize {
        self.array.ndim()
    }

    fn invalid(&self, message: impl Into<String>) -> LayoutError {
        LayoutError::construction(&self.name, message)
    }

    /// Read a shape out of a dims member value.
    fn shape_of(&self, dims: &Value) -> Result<Vec<usize>> {
        let counts: Vec<&Value> = match dims {
            Value::Array(a) => a.items().iter().collect(),
            Value::Structure(s) => s.members().iter().map(|(_, v)| v).collect(),
            leaf => vec![leaf],
        };
        counts
            .into_iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| self.invalid(format!("dims entry {v} is not a valid length")))
            })
            .collect()
    }

    /// The dims member value describing `shape`.
    fn dims_value(&self, shape: &[usize]) -> Result<Value> {
        let data = match &self.dims {
            Layout::Scalar(_) => JsonValue::from(shape[0]),
            Layout::Structure(s) => {
                let map: Map<String, JsonValue> = s
                    .members()
                    .iter()
                    .zip(shape)
                    .map(|(m, &n)| (m.name.clone(), JsonValue::from(n)))
                    .collect();
                JsonValue::Object(map)
            }
            _ => JsonValue::from(shape.to_vec()),
        };
        self.dims.build(&data)
    }

    fn compose(&self, dims: Value, array: Value) -> Value {
        Value::Structure(StructValue::composite(
            StructKind::SizedArray,
            vec![(self.dims_name.clone(), dims), (self.array_name.clone(), array)],
            1,
        ))
    }

    /// Split a value into its dims and array members.
    fn parts<'v>(&self, value: &'v Value) -> Result<(&'v Value, &'v ArrayValue)> {
        let s = value
            .as_structure()
            .ok_or_else(|| self.invalid(format!("expected a sized array, got {}", value.kind_name())))?;
        let dims = s
            .get(&self.dims_name)
            .ok_or_else(|| self.invalid(format!("missing members: {}", self.dims_name)))?;
        let array = s
            .get(&self.array_name)
            .and_then(Value::as_array)
            .ok_or_else(|| self.invalid(format!("member {} is not an array", self.array_name)))?;
        Ok((dims, array))
    }
}

impl Codec for SizedArrayType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn build(&self, data: &JsonValue) -> Result<Value> {
        let (dims_data, array_data) = match data {
            JsonValue::Array(_) => (None, data),
            JsonValue::Object(map) => {
                let unexpected: Vec<&str> = map
                    .keys()
                    .map(String::as_str)
                    .filter(|k| *k != self.dims_name && *k != self.array_name)
                    .collect();
                if !unexpected.is_empty() {
                    return Err(self.invalid(format!("unexpected members: {}", unexpected.join(", "))));
                }
                let array = map
                    .get(&self.array_name)
                    .ok_or_else(|| self.invalid(format!("missing members: {}", self.array_name)))?;
                (map.get(&self.dims_name), array)
            }
            other => {
                return Err(self.invalid(format!(
                    "expected a {}-dimensional nested sequence, got {other}",
                    self.ndim()
                )))
            }
        };

        let array = self.array.build(array_data)?;
        let shape = array.as_array().map(|a| a.shape().to_vec()).unwrap_or_default();
        let dims = match dims_data {
            Some(d) => {
                let dims = self.dims.build(d)?;
                let declared = self.shape_of(&dims)?;
                if declared != shape {
                    return Err(self.invalid(format!(
                        "dims {declared:?} disagree with the array shape {shape:?}"
                    )));
                }
                dims
            }
            None => self.dims_value(&shape)?,
        };
        Ok(self.compose(dims, array))
    }

    fn pack_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        let (dims, array) = self.parts(value)?;
        let declared = self.shape_of(dims)?;
        if declared != array.shape() {
            return Err(self.invalid(format!(
                "dims {declared:?} disagree with the array shape {:?}",
                array.shape()
            )));
        }
        self.inner.pack_into(value, out)
    }

    fn unpack(&self, view: &mut MemoryView<'_>, mut dump: Option<&mut Dump>) -> Result<Value> {
        if let Some(d) = dump.as_deref_mut() {
            d.record_composite(&self.name, view.offset());
        }
        let dims = nested(&mut dump, PathSegment::Member(self.dims_name.clone()), |d| {
            self.dims.unpack(view, d)
        })?;
        let shape = self.shape_of(&dims)?;
        let array = nested(&mut dump, PathSegment::Member(self.array_name.clone()), |d| {
            self.array.unpack_with_dims(view, d, &shape)
        })?;
        Ok(self.compose(dims, array))
    }

    fn calcsize(&self) -> Result<usize> {
        Err(LayoutError::size(&self.name, "the array shape is read from the dims member"))
    }

    fn nbytes(&self, value: &Value) -> Result<usize> {
        self.inner.nbytes(value)
    }
}
