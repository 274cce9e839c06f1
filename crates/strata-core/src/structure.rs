//! Named-member structure layout and its type-builder.

use serde_json::{Map, Value as JsonValue};

use crate::codec::Codec;
use crate::dump::{nested, Dump, PathSegment};
use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::memory::MemoryView;
use crate::value::{StructValue, Value};

/// One named member of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub layout: Layout,
}

impl Member {
    pub fn new(name: impl Into<String>, layout: Layout) -> Self {
        Self {
            name: name.into(),
            layout,
        }
    }
}

/// An ordered list of named members, packed back to back.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureType {
    name: String,
    members: Vec<Member>,
}

/// Incrementally defines a [`StructureType`].
///
/// Problems are collected as members are added and reported together by
/// [`build`](StructureBuilder::build).
#[derive(Debug, Clone)]
pub struct StructureBuilder {
    name: String,
    members: Vec<Member>,
    problems: Vec<String>,
}

impl StructureBuilder {
    /// Append a member.
    pub fn member(mut self, name: impl Into<String>, layout: Layout) -> Self {
        let name = name.into();
        if self.position(&name).is_some() {
            self.problems.push(format!("duplicate member `{name}`"));
        } else {
            self.members.push(Member::new(name, layout));
        }
        self
    }

    /// Replace the layout of an existing member.
    pub fn retype(mut self, name: &str, layout: Layout) -> Self {
        match self.position(name) {
            Some(i) => self.members[i].layout = layout,
            None => self.problems.push(format!("cannot retype unknown member `{name}`")),
        }
        self
    }

    /// Rename an existing member, keeping its position.
    pub fn rename(mut self, old: &str, new: impl Into<String>) -> Self {
        let new = new.into();
        match (self.position(old), self.position(&new)) {
            (None, _) => self.problems.push(format!("cannot rename unknown member `{old}`")),
            (Some(_), Some(_)) => self.problems.push(format!("duplicate member `{new}`")),
            (Some(i), None) => self.members[i].name = new,
        }
        self
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }

    pub fn build(self) -> Result<StructureType> {
        if !self.problems.is_empty() {
            return Err(LayoutError::construction(&self.name, self.problems.join("; ")));
        }
        Ok(StructureType {
            name: self.name,
            members: self.members,
        })
    }
}

impl StructureType {
    pub fn builder(name: impl Into<String>) -> StructureBuilder {
        StructureBuilder {
            name: name.into(),
            members: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// Start a new structure from the members of `base`.
    pub fn extend(base: &StructureType, name: impl Into<String>) -> StructureBuilder {
        StructureBuilder {
            name: name.into(),
            members: base.members.clone(),
            problems: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    fn invalid(&self, message: impl Into<String>) -> LayoutError {
        LayoutError::construction(&self.name, message)
    }

    fn expect_struct<'v>(&self, value: &'v Value) -> Result<&'v StructValue> {
        value
            .as_structure()
            .ok_or_else(|| self.invalid(format!("expected a structure, got {}", value.kind_name())))
    }

    /// Check that `keys` names exactly the declared members.
    pub(crate) fn check_keys<'k>(&self, keys: impl Iterator<Item = &'k str>) -> Result<()> {
        let keys: Vec<&str> = keys.collect();
        let unexpected: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|k| self.member(k).is_none())
            .collect();
        let missing: Vec<&str> = self
            .members
            .iter()
            .map(|m| m.name.as_str())
            .filter(|name| !keys.contains(name))
            .collect();
        let mut problems = Vec::new();
        if !unexpected.is_empty() {
            problems.push(format!("unexpected members: {}", unexpected.join(", ")));
        }
        if !missing.is_empty() {
            problems.push(format!("missing members: {}", missing.join(", ")));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(self.invalid(problems.join("; ")))
        }
    }

    /// Build every member from an object, in declaration order.
    pub(crate) fn build_members(&self, map: &Map<String, JsonValue>) -> Result<Vec<(String, Value)>> {
        self.check_keys(map.keys().map(String::as_str))?;
        self.members
            .iter()
            .map(|m| Ok((m.name.clone(), m.layout.build(&map[&m.name])?)))
            .collect()
    }

    /// Unpack every member in order, each one dump level deeper.
    pub(crate) fn unpack_members(
        &self,
        view: &mut MemoryView<'_>,
        dump: &mut Option<&mut Dump>,
    ) -> Result<Vec<(String, Value)>> {
        let mut values = Vec::with_capacity(self.members.len());
        for m in &self.members {
            let value = nested(dump, PathSegment::Member(m.name.clone()), |d| {
                m.layout.unpack(view, d)
            })?;
            values.push((m.name.clone(), value));
        }
        Ok(values)
    }
}

impl Codec for StructureType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn build(&self, data: &JsonValue) -> Result<Value> {
        let map = data
            .as_object()
            .ok_or_else(|| self.invalid(format!("expected an object, got {data}")))?;
        Ok(Value::Structure(StructValue::new(self.build_members(map)?)))
    }

    fn pack_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        let s = self.expect_struct(value)?;
        self.check_keys(s.names())?;
        for m in &self.members {
            if let Some(member) = s.get(&m.name) {
                m.layout.pack_into(member, out)?;
            }
        }
        Ok(())
    }

    fn unpack(&self, view: &mut MemoryView<'_>, mut dump: Option<&mut Dump>) -> Result<Value> {
        if let Some(d) = dump.as_deref_mut() {
            d.record_composite(&self.name, view.offset());
        }
        let members = self.unpack_members(view, &mut dump)?;
        Ok(Value::Structure(StructValue::new(members)))
    }

    fn calcsize(&self) -> Result<usize> {
        self.members.iter().map(|m| m.layout.calcsize()).sum()
    }

    fn nbytes(&self, value: &Value) -> Result<usize> {
        let s = self.expect_struct(value)?;
        self.members
            .iter()
            .map(|m| match s.get(&m.name) {
                Some(member) => m.layout.nbytes(member),
                None => Err(self.invalid(format!("missing members: {}", m.name))),
            })
            .sum()
    }
}
