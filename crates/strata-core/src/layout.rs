//! The closed set of layout families.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::array::ArrayType;
use crate::codec::Codec;
use crate::dump::Dump;
use crate::error::Result;
use crate::memory::MemoryView;
use crate::scalar::{Endian, ScalarKind, ScalarType};
use crate::sized_array::SizedArrayType;
use crate::sized_object::SizedObjectType;
use crate::structure::StructureType;
use crate::value::Value;

/// A concrete layout, shared cheaply between the layouts that contain it.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Scalar(ScalarType),
    Array(Arc<ArrayType>),
    Structure(Arc<StructureType>),
    SizedArray(Arc<SizedArrayType>),
    SizedObject(Arc<SizedObjectType>),
}

impl Layout {
    /// A little-endian scalar of `kind`.
    pub fn scalar(kind: ScalarKind) -> Self {
        Layout::Scalar(ScalarType::new(kind, Endian::Little))
    }

    pub fn uint8() -> Self {
        Self::scalar(ScalarKind::U8)
    }

    pub fn uint16() -> Self {
        Self::scalar(ScalarKind::U16)
    }

    pub fn uint32() -> Self {
        Self::scalar(ScalarKind::U32)
    }

    pub fn uint64() -> Self {
        Self::scalar(ScalarKind::U64)
    }

    pub fn int32() -> Self {
        Self::scalar(ScalarKind::I32)
    }

    pub fn float64() -> Self {
        Self::scalar(ScalarKind::F64)
    }

    pub fn as_scalar(&self) -> Option<&ScalarType> {
        match self {
            Layout::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is an unsigned integer scalar, usable as a count or size.
    pub fn is_unsigned_scalar(&self) -> bool {
        self.as_scalar().is_some_and(|s| s.kind().is_unsigned())
    }

    /// Family name, for listings.
    pub fn family(&self) -> &'static str {
        match self {
            Layout::Scalar(_) => "scalar",
            Layout::Array(_) => "array",
            Layout::Structure(_) => "structure",
            Layout::SizedArray(_) => "sized-array",
            Layout::SizedObject(_) => "sized-object",
        }
    }

    /// Fewest bytes any instance can occupy.
    pub fn min_size(&self) -> usize {
        match self {
            Layout::Scalar(t) => t.width(),
            Layout::Array(t) => match t.static_dims() {
                Some(dims) => dims
                    .iter()
                    .fold(t.item().min_size(), |acc, &d| acc.saturating_mul(d)),
                None => 0,
            },
            Layout::Structure(t) => t
                .members()
                .iter()
                .fold(0, |acc, m| acc.saturating_add(m.layout.min_size())),
            Layout::SizedArray(t) => t.dims_layout().min_size(),
            Layout::SizedObject(t) => t.size_layout().min_size(),
        }
    }

    fn codec(&self) -> &dyn Codec {
        match self {
            Layout::Scalar(t) => t,
            Layout::Array(t) => t.as_ref(),
            Layout::Structure(t) => t.as_ref(),
            Layout::SizedArray(t) => t.as_ref(),
            Layout::SizedObject(t) => t.as_ref(),
        }
    }
}

impl Codec for Layout {
    fn type_name(&self) -> &str {
        self.codec().type_name()
    }

    fn build(&self, data: &JsonValue) -> Result<Value> {
        self.codec().build(data)
    }

    fn pack_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        self.codec().pack_into(value, out)
    }

    fn unpack(&self, view: &mut MemoryView<'_>, dump: Option<&mut Dump>) -> Result<Value> {
        self.codec().unpack(view, dump)
    }

    fn calcsize(&self) -> Result<usize> {
        self.codec().calcsize()
    }

    fn nbytes(&self, value: &Value) -> Result<usize> {
        self.codec().nbytes(value)
    }
}

impl From<ScalarType> for Layout {
    fn from(t: ScalarType) -> Self {
        Layout::Scalar(t)
    }
}

impl From<ArrayType> for Layout {
    fn from(t: ArrayType) -> Self {
        Layout::Array(Arc::new(t))
    }
}

impl From<StructureType> for Layout {
    fn from(t: StructureType) -> Self {
        Layout::Structure(Arc::new(t))
    }
}

impl From<SizedArrayType> for Layout {
    fn from(t: SizedArrayType) -> Self {
        Layout::SizedArray(Arc::new(t))
    }
}

impl From<SizedObjectType> for Layout {
    fn from(t: SizedObjectType) -> Self {
        Layout::SizedObject(Arc::new(t))
    }
}
