//! Size-prefixed objects.
//!
//! A sized object is a size member followed by an item member. The size
//! counts units of `factor` bytes, and the item is decoded inside a limit of
//! exactly `size * factor` bytes, so a greedy item stops at the declared end.
//! An item that stops short of its budget is an [`LayoutError::ExcessMemory`]
//! for the item: the budget belongs to the item alone.

use serde_json::Value as JsonValue;

use crate::codec::Codec;
use crate::dump::{nested, Dump, PathSegment};
use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::memory::MemoryView;
use crate::structure::StructureType;
use crate::value::{StructKind, StructValue, Value};

/// Parameters of a sized object family.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedObjectType {
    name: String,
    size_name: String,
    size: Layout,
    factor: usize,
    item_name: String,
    item: Layout,
    inner: StructureType,
}

/// Defines a [`SizedObjectType`].
#[derive(Debug, Clone)]
pub struct SizedObjectBuilder {
    name: String,
    size_name: String,
    size: Option<Layout>,
    factor: usize,
    item_name: String,
    item: Option<Layout>,
}

impl SizedObjectBuilder {
    /// Name and layout of the size member.
    pub fn size(mut self, name: impl Into<String>, layout: Layout) -> Self {
        self.size_name = name.into();
        self.size = Some(layout);
        self
    }

    pub fn size_name(mut self, name: impl Into<String>) -> Self {
        self.size_name = name.into();
        self
    }

    pub fn size_layout(mut self, layout: Layout) -> Self {
        self.size = Some(layout);
        self
    }

    /// Bytes per size unit.
    pub fn factor(mut self, factor: usize) -> Self {
        self.factor = factor;
        self
    }

    /// Name and layout of the item member.
    pub fn item(mut self, name: impl Into<String>, layout: Layout) -> Self {
        self.item_name = name.into();
        self.item = Some(layout);
        self
    }

    pub fn item_name(mut self, name: impl Into<String>) -> Self {
        self.item_name = name.into();
        self
    }

    pub fn item_layout(mut self, layout: Layout) -> Self {
        self.item = Some(layout);
        self
    }

    pub fn build(self) -> Result<SizedObjectType> {
        let invalid = |message: String| LayoutError::construction(&self.name, message);
        let size = self
            .size
            .clone()
            .ok_or_else(|| invalid("no size member layout given".to_string()))?;
        if !size.is_unsigned_scalar() {
            return Err(invalid(format!(
                "size member {} is not an unsigned scalar",
                size.type_name()
            )));
        }
        let item = self
            .item
            .clone()
            .ok_or_else(|| invalid("no item layout given".to_string()))?;
        if self.factor == 0 {
            return Err(invalid("factor must be positive".to_string()));
        }
        let inner = StructureType::builder(self.name.clone())
            .member(self.size_name.clone(), size.clone())
            .member(self.item_name.clone(), item.clone())
            .build()?;
        Ok(SizedObjectType {
            name: self.name,
            size_name: self.size_name,
            size,
            factor: self.factor,
            item_name: self.item_name,
            item,
            inner,
        })
    }
}

impl SizedObjectType {
    pub fn builder(name: impl Into<String>) -> SizedObjectBuilder {
        SizedObjectBuilder {
            name: name.into(),
            size_name: "size".to_string(),
            size: None,
            factor: 1,
            item_name: "item".to_string(),
            item: None,
        }
    }

    /// Start a new family from the parameters of `base`.
    pub fn extend(base: &SizedObjectType, name: impl Into<String>) -> SizedObjectBuilder {
        SizedObjectBuilder {
            name: name.into(),
            size_name: base.size_name.clone(),
            size: Some(base.size.clone()),
            factor: base.factor,
            item_name: base.item_name.clone(),
            item: Some(base.item.clone()),
        }
    }

    pub fn size_name(&self) -> &str {
        &self.size_name
    }

    pub fn size_layout(&self) -> &Layout {
        &self.size
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn item(&self) -> &Layout {
        &self.item
    }

    fn invalid(&self, message: impl Into<String>) -> LayoutError {
        LayoutError::construction(&self.name, message)
    }

    fn budget(&self, size: &Value) -> Result<usize> {
        size.as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .and_then(|n| n.checked_mul(self.factor))
            .ok_or_else(|| self.invalid(format!("size {size} does not fit in memory")))
    }

    /// Size member value for an item of `nbytes` bytes.
    fn size_for(&self, nbytes: usize) -> Result<Value> {
        if nbytes % self.factor != 0 {
            return Err(self.invalid(format!(
                "item of {nbytes} bytes is not a multiple of the factor {}",
                self.factor
            )));
        }
        self.size.build(&JsonValue::from(nbytes / self.factor))
    }

    fn compose(&self, size: Value, item: Value) -> Value {
        Value::Structure(StructValue::composite(
            StructKind::SizedObject,
            vec![(self.size_name.clone(), size), (self.item_name.clone(), item)],
            1,
        ))
    }

    fn unpack_item(&self, view: &mut MemoryView<'_>, mut dump: Option<&mut Dump>, nbytes: usize) -> Result<Value> {
        let available = view.available();
        if available < nbytes {
            if let Some(d) = dump.as_deref_mut() {
                d.record_shortfall(self.item.type_name(), view.offset(), view.remaining(), nbytes - available);
            }
            return Err(LayoutError::InsufficientMemory {
                shortfall: nbytes - available,
                dump: None,
            });
        }
        view.with_limit(nbytes, |scoped| {
            let item = self.item.unpack(scoped, dump.as_deref_mut())?;
            let leftover = scoped.available();
            if leftover > 0 {
                if let Some(d) = dump {
                    d.record_leftover(scoped.offset(), scoped.remaining());
                }
                return Err(LayoutError::ExcessMemory {
                    unconsumed: leftover,
                    consumed: nbytes - leftover,
                    available: nbytes,
                    dump: None,
                });
            }
            Ok(item)
        })
    }
}

impl Codec for SizedObjectType {
    fn type_name(&self) -> &str {
        &self.name
    }

    /// Accepts `{size?, item}` or the item itself. Data that reads both ways
    /// (an item structure with members named like the wrapper) is taken as the
    /// item when it builds as one.
    fn build(&self, data: &JsonValue) -> Result<Value> {
        let wrapped = data.as_object().filter(|map| {
            map.contains_key(&self.item_name)
                && map.keys().all(|k| *k == self.size_name || *k == self.item_name)
        });
        let (size_data, item) = match wrapped {
            Some(map) => match self.item.build(data) {
                Ok(item) => (None, item),
                Err(_) => (map.get(&self.size_name), self.item.build(&map[&self.item_name])?),
            },
            None => (None, self.item.build(data)?),
        };

        let nbytes = self.item.nbytes(&item)?;
        let size = match size_data {
            Some(d) => {
                let size = self.size.build(d)?;
                let budget = self.budget(&size)?;
                if budget != nbytes {
                    return Err(self.invalid(format!(
                        "size {size} covers {budget} bytes but the item packs to {nbytes}"
                    )));
                }
                size
            }
            None => self.size_for(nbytes)?,
        };
        Ok(self.compose(size, item))
    }

    fn pack_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        let s = value
            .as_structure()
            .ok_or_else(|| self.invalid(format!("expected a sized object, got {}", value.kind_name())))?;
        if let (Some(size), Some(item)) = (s.get(&self.size_name), s.get(&self.item_name)) {
            let budget = self.budget(size)?;
            let nbytes = self.item.nbytes(item)?;
            if budget != nbytes {
                return Err(self.invalid(format!(
                    "size {size} covers {budget} bytes but the item packs to {nbytes}"
                )));
            }
        }
        self.inner.pack_into(value, out)
    }

    fn unpack(&self, view: &mut MemoryView<'_>, mut dump: Option<&mut Dump>) -> Result<Value> {
        if let Some(d) = dump.as_deref_mut() {
            d.record_composite(&self.name, view.offset());
        }
        let size = nested(&mut dump, PathSegment::Member(self.size_name.clone()), |d| {
            self.size.unpack(view, d)
        })?;
        let nbytes = self.budget(&size)?;
        let item = nested(&mut dump, PathSegment::Member(self.item_name.clone()), |d| {
            self.unpack_item(view, d, nbytes)
        })?;
        Ok(self.compose(size, item))
    }

    fn calcsize(&self) -> Result<usize> {
        Ok(self.size.calcsize()? + self.item.calcsize()?)
    }

    fn nbytes(&self, value: &Value) -> Result<usize> {
        self.inner.nbytes(value)
    }
}
