//! Multi-dimensional array values.
//!
//! An [`ArrayValue`] owns a single row-major item store plus its shape.
//! Indexing along the outer dimension yields either an item (last
//! dimension) or an [`ArrayView`] borrowing a contiguous run of the store.

use std::ops::{Bound, RangeBounds};

use serde_json::Value as JsonValue;

use super::{json_eq, Value};
use crate::error::{LayoutError, Result};

/// An owned N-dimensional array, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    shape: Vec<usize>,
    items: Vec<Value>,
}

/// A borrowed, possibly sliced, sub-array.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a> {
    len: usize,
    inner: &'a [usize],
    items: &'a [Value],
}

/// Result of indexing an array along its outer dimension.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Item(&'a Value),
    Array(ArrayView<'a>),
}

impl ArrayValue {
    /// Create an array from its shape and row-major items.
    pub fn new(shape: Vec<usize>, items: Vec<Value>) -> Result<Self> {
        if shape.is_empty() {
            return Err(LayoutError::construction("Array", "shape needs at least one dimension"));
        }
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| {
                LayoutError::construction("Array", format!("shape {shape:?} is too large"))
            })?;
        if expected != items.len() {
            return Err(LayoutError::construction(
                "Array",
                format!("shape {shape:?} holds {expected} items, got {}", items.len()),
            ));
        }
        Ok(Self { shape, items })
    }

    /// A one-dimensional array of `items`.
    pub fn from_items(items: Vec<Value>) -> Self {
        Self {
            shape: vec![items.len()],
            items,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Length of the outer dimension.
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All items in row-major order.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    /// Borrow the whole array as a view.
    pub fn view(&self) -> ArrayView<'_> {
        ArrayView {
            len: self.shape[0],
            inner: &self.shape[1..],
            items: &self.items,
        }
    }

    pub fn get(&self, index: usize) -> Option<Element<'_>> {
        self.view().get(index)
    }

    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Option<ArrayView<'_>> {
        self.view().slice(range)
    }

    pub fn iter(&self) -> impl Iterator<Item = Element<'_>> {
        self.view().iter()
    }

    /// Replace the item or sub-array at `index`.
    ///
    /// A full index (one entry per dimension) replaces a single item. A
    /// shorter index replaces a whole sub-array, which must have exactly the
    /// shape of the one it replaces. The array's own shape never changes.
    pub fn set(&mut self, index: &[usize], value: Value) -> Result<()> {
        if index.is_empty() || index.len() > self.ndim() {
            return Err(LayoutError::construction(
                "Array",
                format!(
                    "index {index:?} does not address a {}-dimensional array",
                    self.ndim()
                ),
            ));
        }
        let mut start = 0;
        for (level, &i) in index.iter().enumerate() {
            if i >= self.shape[level] {
                return Err(LayoutError::construction(
                    "Array",
                    format!("index {i} out of range for dimension of length {}", self.shape[level]),
                ));
            }
            let stride: usize = self.shape[level + 1..].iter().product();
            start += i * stride;
        }

        if index.len() == self.ndim() {
            let slot = &mut self.items[start];
            if slot.kind_name() != value.kind_name() {
                return Err(LayoutError::construction(
                    "Array",
                    format!(
                        "item at {index:?} is {}, got {}",
                        slot.kind_name(),
                        describe_shape(&value)
                    ),
                ));
            }
            *slot = value;
            return Ok(());
        }

        let sub_shape = &self.shape[index.len()..];
        match value {
            Value::Array(sub) if sub.shape == sub_shape => {
                let count = sub.items.len();
                self.items.splice(start..start + count, sub.items);
                Ok(())
            }
            other => Err(LayoutError::construction(
                "Array",
                format!(
                    "expected a sub-array of shape {sub_shape:?}, got {}",
                    describe_shape(&other)
                ),
            )),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        self.view().to_json()
    }
}

fn describe_shape(value: &Value) -> String {
    match value {
        Value::Array(a) => format!("shape {:?}", a.shape),
        other => other.kind_name().to_string(),
    }
}

impl<'a> ArrayView<'a> {
    /// Length of the outer dimension.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ndim(&self) -> usize {
        self.inner.len() + 1
    }

    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(self.ndim());
        shape.push(self.len);
        shape.extend_from_slice(self.inner);
        shape
    }

    /// Items covered by this view, row-major.
    pub fn items(&self) -> &'a [Value] {
        self.items
    }

    fn stride(&self) -> usize {
        self.inner.iter().product()
    }

    pub fn get(&self, index: usize) -> Option<Element<'a>> {
        if index >= self.len {
            return None;
        }
        if self.inner.is_empty() {
            return Some(Element::Item(&self.items[index]));
        }
        let stride = self.stride();
        Some(Element::Array(ArrayView {
            len: self.inner[0],
            inner: &self.inner[1..],
            items: &self.items[index * stride..(index + 1) * stride],
        }))
    }

    /// A view over a range of the outer dimension.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Option<ArrayView<'a>> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e + 1,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };
        if start > end || end > self.len {
            return None;
        }
        let stride = self.stride();
        Some(ArrayView {
            len: end - start,
            inner: self.inner,
            items: &self.items[start * stride..end * stride],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let view = *self;
        (0..view.len).filter_map(move |i| view.get(i))
    }

    /// Copy the viewed items out into an owned array.
    pub fn to_array(&self) -> ArrayValue {
        ArrayValue {
            shape: self.shape(),
            items: self.items.to_vec(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(|e| e.to_json()).collect())
    }
}

impl<'a> Element<'a> {
    pub fn as_item(&self) -> Option<&'a Value> {
        match self {
            Element::Item(v) => Some(v),
            Element::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<ArrayView<'a>> {
        match self {
            Element::Item(_) => None,
            Element::Array(a) => Some(*a),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Element::Item(v) => v.to_json(),
            Element::Array(a) => a.to_json(),
        }
    }
}

impl PartialEq for ArrayView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.inner == other.inner && self.items == other.items
    }
}

impl PartialEq<JsonValue> for ArrayView<'_> {
    fn eq(&self, other: &JsonValue) -> bool {
        let Some(seq) = other.as_array() else {
            return false;
        };
        seq.len() == self.len && self.iter().zip(seq).all(|(e, j)| e == *j)
    }
}

impl PartialEq<JsonValue> for Element<'_> {
    fn eq(&self, other: &JsonValue) -> bool {
        match self {
            Element::Item(v) => json_eq(v, other),
            Element::Array(a) => a == other,
        }
    }
}

impl PartialEq<JsonValue> for ArrayValue {
    fn eq(&self, other: &JsonValue) -> bool {
        self.view() == *other
    }
}

impl PartialEq<ArrayView<'_>> for ArrayValue {
    fn eq(&self, other: &ArrayView<'_>) -> bool {
        self.view() == *other
    }
}
