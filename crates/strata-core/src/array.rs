//! Multi-dimensional array layout.
//!
//! An [`ArrayType`] is an item layout plus a dimension list. A dimension is
//! either fixed at definition time or open (`None`), in which case its
//! length comes from the data: from the supplied nested sequence when
//! building, from the caller (see [`ArrayType::unpack_with_dims`]) or from
//! the bytes available when unpacking.

use serde_json::Value as JsonValue;

use crate::codec::Codec;
use crate::dump::{nested, Dump, PathSegment};
use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::memory::MemoryView;
use crate::value::{ArrayValue, Value};

/// Array layout: item layout and dimensions, outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    name: String,
    item: Layout,
    dims: Vec<Option<usize>>,
}

impl ArrayType {
    /// Create an array of `item` with the given dimensions.
    pub fn new(item: Layout, dims: Vec<Option<usize>>) -> Result<Self> {
        if dims.is_empty() {
            return Err(LayoutError::construction(
                item.type_name(),
                "an array needs at least one dimension",
            ));
        }
        let name = default_name(&item, &dims);
        Ok(Self { name, item, dims })
    }

    /// All dimensions fixed.
    pub fn fixed(item: Layout, dims: &[usize]) -> Result<Self> {
        Self::new(item, dims.iter().copied().map(Some).collect())
    }

    /// Outermost dimension open, the rest fixed: unpacking reads rows until
    /// the bytes run out.
    pub fn greedy(item: Layout, inner: &[usize]) -> Result<Self> {
        let mut dims = vec![None];
        dims.extend(inner.iter().copied().map(Some));
        Self::new(item, dims)
    }

    /// Every dimension open.
    pub fn open(item: Layout, ndim: usize) -> Result<Self> {
        Self::new(item, vec![None; ndim])
    }

    /// Replace the generated name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn item(&self) -> &Layout {
        &self.item
    }

    pub fn dims(&self) -> &[Option<usize>] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    fn invalid(&self, message: impl Into<String>) -> LayoutError {
        LayoutError::construction(&self.name, message)
    }

    fn ragged(&self, level: usize) -> LayoutError {
        self.invalid(format!(
            "expected a {}-dimensional nested sequence, ragged or too shallow at level {level}",
            self.ndim()
        ))
    }

    /// Shape of nested plain data, measured down to this array's
    /// dimensionality.
    ///
    /// Levels below an empty sequence take their fixed length, or zero.
    pub fn measure(&self, data: &JsonValue) -> Result<Vec<usize>> {
        let mut shape = Vec::with_capacity(self.ndim());
        let mut cursor = Some(data);
        for (level, dim) in self.dims.iter().enumerate() {
            match cursor {
                Some(JsonValue::Array(seq)) => {
                    shape.push(seq.len());
                    cursor = seq.first();
                }
                Some(_) => return Err(self.ragged(level)),
                None => shape.push(dim.unwrap_or(0)),
            }
        }
        Ok(shape)
    }

    /// Check a concrete shape against the declared dimensions.
    fn check_shape(&self, shape: &[usize]) -> Result<()> {
        if shape.len() != self.ndim() {
            return Err(self.invalid(format!(
                "expected {} dimensions, got shape {shape:?}",
                self.ndim()
            )));
        }
        for (level, (dim, &len)) in self.dims.iter().zip(shape).enumerate() {
            if let Some(fixed) = dim {
                if *fixed != len {
                    return Err(self.invalid(format!(
                        "dimension {level} must have length {fixed}, got {len}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn flatten(&self, data: &JsonValue, shape: &[usize], level: usize, out: &mut Vec<Value>) -> Result<()> {
        if level == shape.len() {
            out.push(self.item.build(data)?);
            return Ok(());
        }
        match data {
            JsonValue::Array(seq) if seq.len() == shape[level] => {
                for element in seq {
                    self.flatten(element, shape, level + 1, out)?;
                }
                Ok(())
            }
            _ => Err(self.ragged(level)),
        }
    }

    /// Fixed dimensions as a concrete shape, if every dimension is fixed.
    pub fn static_dims(&self) -> Option<Vec<usize>> {
        self.dims.iter().copied().collect()
    }

    /// Unpack with an explicit shape, one entry per dimension.
    pub fn unpack_with_dims(
        &self,
        view: &mut MemoryView<'_>,
        mut dump: Option<&mut Dump>,
        dims: &[usize],
    ) -> Result<Value> {
        self.check_shape(dims)?;
        if let Some(d) = dump.as_deref_mut() {
            d.record_composite(&self.name, view.offset());
        }
        let mut items = Vec::new();
        if !dims.contains(&0) {
            if self.item.min_size() == 0 {
                self.check_count(view, dump.as_deref_mut(), dims)?;
            }
            self.fill(view, &mut dump, dims, &mut items)?;
        }
        Ok(Value::Array(ArrayValue::new(dims.to_vec(), items)?))
    }

    /// Items that may occupy no bytes are counted as one byte each, so a
    /// decoded count cannot ask for more of them than there are bytes left.
    ///
    /// Wider items need no such check: reading stops at the first item the
    /// bytes run out on.
    fn check_count(&self, view: &MemoryView<'_>, dump: Option<&mut Dump>, dims: &[usize]) -> Result<()> {
        let available = view.available();
        let shortfall = match dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)) {
            Some(count) if count <= available => return Ok(()),
            Some(count) => count - available,
            None => usize::MAX - available,
        };
        if let Some(d) = dump {
            d.record_shortfall(&self.name, view.offset(), view.remaining(), shortfall);
        }
        Err(LayoutError::insufficient(shortfall))
    }

    fn fill(
        &self,
        view: &mut MemoryView<'_>,
        dump: &mut Option<&mut Dump>,
        dims: &[usize],
        items: &mut Vec<Value>,
    ) -> Result<()> {
        let Some((&len, inner)) = dims.split_first() else {
            return Ok(());
        };
        for i in 0..len {
            nested(dump, PathSegment::Index(i), |mut d| self.row(view, &mut d, inner, items))?;
        }
        Ok(())
    }

    /// One element along a dimension: an item, or a sub-array of `inner`.
    fn row(
        &self,
        view: &mut MemoryView<'_>,
        dump: &mut Option<&mut Dump>,
        inner: &[usize],
        items: &mut Vec<Value>,
    ) -> Result<()> {
        if inner.is_empty() {
            items.push(self.item.unpack(view, dump.as_deref_mut())?);
            return Ok(());
        }
        if let Some(d) = dump.as_deref_mut() {
            d.record_composite(&sub_name(&self.item, inner), view.offset());
        }
        self.fill(view, dump, inner, items)
    }

    /// Read rows of the fixed inner shape until the active limit is exhausted.
    fn unpack_greedy(&self, view: &mut MemoryView<'_>, mut dump: Option<&mut Dump>) -> Result<Value> {
        let inner: Vec<usize> = match self.dims[1..].iter().copied().collect::<Option<_>>() {
            Some(inner) => inner,
            None => {
                return Err(LayoutError::size(
                    &self.name,
                    "only the outermost dimension may be open without explicit dims",
                ))
            }
        };
        if let Some(d) = dump.as_deref_mut() {
            d.record_composite(&self.name, view.offset());
        }
        let mut items = Vec::new();
        let mut rows = 0;
        while view.available() > 0 {
            let before = view.offset();
            nested(&mut dump, PathSegment::Index(rows), |mut d| {
                self.row(view, &mut d, &inner, &mut items)
            })?;
            if view.offset() == before {
                return Err(LayoutError::size(&self.name, "rows of zero bytes cannot fill a buffer"));
            }
            rows += 1;
        }
        let mut shape = vec![rows];
        shape.extend(inner);
        Ok(Value::Array(ArrayValue::new(shape, items)?))
    }

    fn expect_array<'v>(&self, value: &'v Value) -> Result<&'v ArrayValue> {
        value
            .as_array()
            .ok_or_else(|| self.invalid(format!("expected an array, got {}", value.kind_name())))
    }
}

impl Codec for ArrayType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn build(&self, data: &JsonValue) -> Result<Value> {
        let shape = self.measure(data)?;
        self.check_shape(&shape)?;
        let mut items = Vec::new();
        self.flatten(data, &shape, 0, &mut items)?;
        Ok(Value::Array(ArrayValue::new(shape, items)?))
    }

    fn pack_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        let array = self.expect_array(value)?;
        self.check_shape(array.shape())?;
        for item in array.items() {
            self.item.pack_into(item, out)?;
        }
        Ok(())
    }

    fn unpack(&self, view: &mut MemoryView<'_>, dump: Option<&mut Dump>) -> Result<Value> {
        match self.static_dims() {
            Some(dims) => self.unpack_with_dims(view, dump, &dims),
            None => self.unpack_greedy(view, dump),
        }
    }

    fn calcsize(&self) -> Result<usize> {
        let dims = self
            .static_dims()
            .ok_or_else(|| LayoutError::size(&self.name, "array has an open dimension"))?;
        let item = self.item.calcsize()?;
        dims.iter()
            .try_fold(item, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| LayoutError::size(&self.name, "array size overflows usize"))
    }

    fn nbytes(&self, value: &Value) -> Result<usize> {
        let array = self.expect_array(value)?;
        array.items().iter().map(|item| self.item.nbytes(item)).sum()
    }
}

fn default_name(item: &Layout, dims: &[Option<usize>]) -> String {
    let mut name = item.type_name().to_string();
    for dim in dims {
        match dim {
            Some(n) => name.push_str(&format!("[{n}]")),
            None => name.push_str("[]"),
        }
    }
    name
}

fn sub_name(item: &Layout, inner: &[usize]) -> String {
    let dims: Vec<Option<usize>> = inner.iter().copied().map(Some).collect();
    default_name(item, &dims)
}
