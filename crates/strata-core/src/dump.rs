//! Per-field decode diary.
//!
//! A [`Dump`] records one [`DumpRecord`] per field a decode attempts, in
//! order, keyed by access path (`x`, `x.count`, `x.array[1][0]`). When a
//! decode fails the last record is the field that ran out of bytes, so the
//! dump shows exactly how far decoding got.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::value::Value;

/// Root name used for access paths unless another is configured.
pub const DEFAULT_ROOT: &str = "x";

/// Type name of records holding unread bytes.
const EXCESS_TYPE: &str = "<excess bytes>";

/// One step of an access path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named structure member.
    Member(String),
    /// An array index along one dimension.
    Index(usize),
}

/// Structural path from the decoded root to a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessPath {
    pub root: String,
    pub segments: Vec<PathSegment>,
}

impl AccessPath {
    /// Nesting depth below the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for segment in &self.segments {
            match segment {
                PathSegment::Member(name) => write!(f, ".{name}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for AccessPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What a dump record holds in its value column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DumpValue {
    /// A fully decoded leaf value.
    Decoded(Value),
    /// Header row of an array or structure; its parts follow as deeper records.
    Composite,
    /// The field ran out of bytes; `bytes` holds what was there.
    Insufficient { shortfall: usize },
    /// Bytes left over after the top-level decode.
    Excess,
}

/// A single row of a dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpRecord {
    pub path: AccessPath,
    pub type_name: String,
    pub offset: usize,
    pub value: DumpValue,
    pub bytes: Vec<u8>,
}

/// Ordered decode diary for one top-level decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dump {
    root: String,
    #[serde(skip)]
    cursor: Vec<PathSegment>,
    records: Vec<DumpRecord>,
}

impl Default for Dump {
    fn default() -> Self {
        Self::new()
    }
}

impl Dump {
    /// Create an empty dump rooted at [`DEFAULT_ROOT`].
    pub fn new() -> Self {
        Self::with_root(DEFAULT_ROOT)
    }

    /// Create an empty dump whose access paths start at `root`.
    pub fn with_root(root: &str) -> Self {
        Self {
            root: root.to_string(),
            cursor: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn records(&self) -> &[DumpRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DumpRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DumpRecord> {
        self.records.iter()
    }

    /// Look a record up by its rendered access path (e.g. `"x[1][0]"`).
    pub fn find(&self, path: &str) -> Option<&DumpRecord> {
        self.records.iter().find(|r| r.path.to_string() == path)
    }

    /// The record that stopped a failed decode (a shortfall or leftover
    /// bytes), if there is one.
    pub fn failure(&self) -> Option<&DumpRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| matches!(r.value, DumpValue::Insufficient { .. } | DumpValue::Excess))
    }

    /// Path of the field currently being decoded.
    pub fn current_path(&self) -> AccessPath {
        AccessPath {
            root: self.root.clone(),
            segments: self.cursor.clone(),
        }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.cursor.push(segment);
    }

    pub fn pop(&mut self) {
        self.cursor.pop();
    }

    fn record(&mut self, type_name: &str, offset: usize, value: DumpValue, bytes: &[u8]) {
        let path = self.current_path();
        self.records.push(DumpRecord {
            path,
            type_name: type_name.to_string(),
            offset,
            value,
            bytes: bytes.to_vec(),
        });
    }

    /// Record the header row of an array or structure.
    pub fn record_composite(&mut self, type_name: &str, offset: usize) {
        self.record(type_name, offset, DumpValue::Composite, &[]);
    }

    /// Record a decoded leaf value and the bytes it came from.
    pub fn record_value(&mut self, type_name: &str, offset: usize, value: Value, bytes: &[u8]) {
        self.record(type_name, offset, DumpValue::Decoded(value), bytes);
    }

    /// Record the placeholder for a field that ran out of bytes.
    pub fn record_shortfall(&mut self, type_name: &str, offset: usize, bytes: &[u8], shortfall: usize) {
        self.record(type_name, offset, DumpValue::Insufficient { shortfall }, bytes);
    }

    /// Record bytes a bounded field left unread, at the current path.
    pub fn record_leftover(&mut self, offset: usize, bytes: &[u8]) {
        self.record(EXCESS_TYPE, offset, DumpValue::Excess, bytes);
    }

    /// Record the bytes left over after the top-level decode.
    pub fn record_excess(&mut self, offset: usize, bytes: &[u8]) {
        self.cursor.clear();
        self.record(EXCESS_TYPE, offset, DumpValue::Excess, bytes);
    }
}

/// Run `f` one path level deeper when a dump is active.
///
/// The segment is popped again after `f` returns, whether it succeeded or not.
pub fn nested<R>(
    dump: &mut Option<&mut Dump>,
    segment: PathSegment,
    f: impl FnOnce(Option<&mut Dump>) -> R,
) -> R {
    match dump.as_deref_mut() {
        Some(d) => {
            d.push(segment);
            let result = f(Some(&mut *d));
            d.pop();
            result
        }
        None => f(None),
    }
}
