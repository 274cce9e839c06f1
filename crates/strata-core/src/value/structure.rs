//! Named-member aggregate values.

use serde_json::{Map, Value as JsonValue};

use super::{json_eq, ArrayValue, Element, Value};
use crate::error::{LayoutError, Result};

/// Which structure family produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Plain,
    SizedArray,
    SizedObject,
}

/// An ordered set of named members.
///
/// Sized arrays and sized objects are structures too: they carry an
/// auxiliary count/size member next to a primary array/item member, and
/// indexed access goes to the primary member. Their members cannot be
/// replaced individually, only array elements can be reassigned (keeping the
/// shape), so the auxiliary member always agrees with the primary one.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    kind: StructKind,
    members: Vec<(String, Value)>,
    primary: Option<usize>,
}

impl StructValue {
    /// A plain structure with the given members, in order.
    pub fn new(members: Vec<(String, Value)>) -> Self {
        Self {
            kind: StructKind::Plain,
            members,
            primary: None,
        }
    }

    pub(crate) fn composite(kind: StructKind, members: Vec<(String, Value)>, primary: usize) -> Self {
        Self {
            kind,
            members,
            primary: Some(primary),
        }
    }

    pub fn kind(&self) -> StructKind {
        self.kind
    }

    pub fn members(&self) -> &[(String, Value)] {
        &self.members
    }

    pub fn into_members(self) -> Vec<(String, Value)> {
        self.members
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Mutable access to a member of a plain structure.
    ///
    /// Returns `None` for sized arrays and sized objects; use
    /// [`set_item`](Self::set_item) for their elements.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        if self.kind != StructKind::Plain {
            return None;
        }
        self.members
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// The designated array/item member of a sized composite.
    pub fn primary(&self) -> Option<&Value> {
        self.primary.map(|i| &self.members[i].1)
    }

    /// The primary member when it is an array.
    pub fn primary_array(&self) -> Option<&ArrayValue> {
        self.primary().and_then(Value::as_array)
    }

    /// Index the primary array along its outer dimension.
    pub fn at(&self, index: usize) -> Option<Element<'_>> {
        self.primary_array().and_then(|a| a.get(index))
    }

    /// Reassign an element of the primary array without changing its shape.
    pub fn set_item(&mut self, index: &[usize], value: Value) -> Result<()> {
        let slot = self
            .primary
            .map(|i| &mut self.members[i].1)
            .and_then(Value::as_array_mut);
        match slot {
            Some(array) => array.set(index, value),
            None => Err(LayoutError::construction(
                "Structure",
                "only sized composites with an array member support indexed assignment",
            )),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .members
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

impl PartialEq<JsonValue> for StructValue {
    fn eq(&self, other: &JsonValue) -> bool {
        match other {
            JsonValue::Object(map) => {
                map.len() == self.members.len()
                    && self
                        .members
                        .iter()
                        .all(|(name, value)| map.get(name).is_some_and(|j| json_eq(value, j)))
            }
            // A sized composite also compares equal to its bare primary member.
            other => self.primary().is_some_and(|p| json_eq(p, other)),
        }
    }
}
