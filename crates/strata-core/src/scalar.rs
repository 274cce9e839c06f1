//! Fixed-width numeric leaves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::codec::Codec;
use crate::dump::Dump;
use crate::error::{LayoutError, Result};
use crate::memory::MemoryView;
use crate::value::Value;

/// Byte order of a multi-byte scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Numeric kind of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 10] = [
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::U64,
        ScalarKind::I8,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::F32,
        ScalarKind::F64,
    ];

    pub fn width(self) -> usize {
        match self {
            ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => 8,
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::U64
        )
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::U8 => "UInt8",
            ScalarKind::U16 => "UInt16",
            ScalarKind::U32 => "UInt32",
            ScalarKind::U64 => "UInt64",
            ScalarKind::I8 => "Int8",
            ScalarKind::I16 => "Int16",
            ScalarKind::I32 => "Int32",
            ScalarKind::I64 => "Int64",
            ScalarKind::F32 => "Float32",
            ScalarKind::F64 => "Float64",
        }
    }

    /// Inclusive integer range, for range-checking construction.
    fn bounds(self) -> (i128, i128) {
        match self {
            ScalarKind::U8 => (0, u8::MAX.into()),
            ScalarKind::U16 => (0, u16::MAX.into()),
            ScalarKind::U32 => (0, u32::MAX.into()),
            ScalarKind::U64 => (0, u64::MAX.into()),
            ScalarKind::I8 => (i8::MIN.into(), i8::MAX.into()),
            ScalarKind::I16 => (i16::MIN.into(), i16::MAX.into()),
            ScalarKind::I32 => (i32::MIN.into(), i32::MAX.into()),
            ScalarKind::I64 => (i64::MIN.into(), i64::MAX.into()),
            ScalarKind::F32 | ScalarKind::F64 => (i128::MIN, i128::MAX),
        }
    }
}

/// A fixed-width integer or float leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarType {
    kind: ScalarKind,
    endian: Endian,
    name: String,
}

impl ScalarType {
    pub fn new(kind: ScalarKind, endian: Endian) -> Self {
        let name = match endian {
            Endian::Little => kind.name().to_string(),
            Endian::Big if kind.width() == 1 => kind.name().to_string(),
            Endian::Big => format!("{}BE", kind.name()),
        };
        Self { kind, endian, name }
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn width(&self) -> usize {
        self.kind.width()
    }

    /// Parse a scalar name such as `UInt16`, `Int32BE` or `Float64LE`.
    ///
    /// Names without a suffix take `default_endian`.
    pub fn parse(name: &str, default_endian: Endian) -> Option<Self> {
        let (base, endian) = if let Some(base) = name.strip_suffix("BE") {
            (base, Endian::Big)
        } else if let Some(base) = name.strip_suffix("LE") {
            (base, Endian::Little)
        } else {
            (name, default_endian)
        };
        ScalarKind::ALL
            .into_iter()
            .find(|k| k.name() == base)
            .map(|k| ScalarType::new(k, endian))
    }

    fn invalid(&self, message: impl Into<String>) -> LayoutError {
        LayoutError::construction(&self.name, message)
    }

    /// Check that `value` is a number this scalar can hold.
    fn check(&self, value: &Value) -> Result<()> {
        if self.kind.is_integer() {
            let n: i128 = match value {
                Value::UInt(u) => (*u).into(),
                Value::Int(i) => (*i).into(),
                other => {
                    return Err(self.invalid(format!("expected an integer, got {}", other.kind_name())))
                }
            };
            let (lo, hi) = self.kind.bounds();
            if n < lo || n > hi {
                return Err(self.invalid(format!("{n} is outside {lo}..={hi}")));
            }
            Ok(())
        } else if value.as_f64().is_some() {
            Ok(())
        } else {
            Err(self.invalid(format!("expected a number, got {}", value.kind_name())))
        }
    }

    fn encode(&self, value: &Value, out: &mut Vec<u8>) {
        let endian = self.endian;
        macro_rules! put {
            ($x:expr) => {
                match endian {
                    Endian::Little => out.extend_from_slice(&$x.to_le_bytes()),
                    Endian::Big => out.extend_from_slice(&$x.to_be_bytes()),
                }
            };
        }
        let int = value.as_i64().unwrap_or_default();
        let uint = value.as_u64().unwrap_or_default();
        let float = value.as_f64().unwrap_or_default();
        match self.kind {
            ScalarKind::U8 => put!(uint as u8),
            ScalarKind::U16 => put!(uint as u16),
            ScalarKind::U32 => put!(uint as u32),
            ScalarKind::U64 => put!(uint),
            ScalarKind::I8 => put!(int as i8),
            ScalarKind::I16 => put!(int as i16),
            ScalarKind::I32 => put!(int as i32),
            ScalarKind::I64 => put!(int),
            ScalarKind::F32 => put!(float as f32),
            ScalarKind::F64 => put!(float),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Value {
        let endian = self.endian;
        macro_rules! get {
            ($t:ty) => {{
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                match endian {
                    Endian::Little => <$t>::from_le_bytes(raw),
                    Endian::Big => <$t>::from_be_bytes(raw),
                }
            }};
        }
        match self.kind {
            ScalarKind::U8 => Value::UInt(get!(u8).into()),
            ScalarKind::U16 => Value::UInt(get!(u16).into()),
            ScalarKind::U32 => Value::UInt(get!(u32).into()),
            ScalarKind::U64 => Value::UInt(get!(u64)),
            ScalarKind::I8 => Value::Int(get!(i8).into()),
            ScalarKind::I16 => Value::Int(get!(i16).into()),
            ScalarKind::I32 => Value::Int(get!(i32).into()),
            ScalarKind::I64 => Value::Int(get!(i64)),
            ScalarKind::F32 => Value::Float(get!(f32).into()),
            ScalarKind::F64 => Value::Float(get!(f64)),
        }
    }
}

impl Codec for ScalarType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn build(&self, data: &JsonValue) -> Result<Value> {
        let value = if let Some(u) = data.as_u64() {
            Value::UInt(u)
        } else if let Some(i) = data.as_i64() {
            Value::Int(i)
        } else if let Some(f) = data.as_f64() {
            if self.kind.is_integer() {
                return Err(self.invalid(format!("{f} is not an integer")));
            }
            Value::Float(f)
        } else {
            return Err(self.invalid(format!("expected a number, got {data}")));
        };
        self.check(&value)?;
        // Normalise so decoded and built values compare equal.
        Ok(match (self.kind.is_unsigned(), self.kind.is_integer(), value) {
            (false, true, Value::UInt(u)) => Value::Int(u as i64),
            (_, false, v) => {
                let f = v.as_f64().unwrap_or_default();
                match self.kind {
                    ScalarKind::F32 => Value::Float(f64::from(f as f32)),
                    _ => Value::Float(f),
                }
            }
            (_, _, v) => v,
        })
    }

    fn pack_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        self.check(value)?;
        self.encode(value, out);
        Ok(())
    }

    fn unpack(&self, view: &mut MemoryView<'_>, mut dump: Option<&mut Dump>) -> Result<Value> {
        let offset = view.offset();
        let bytes = view.consume_field(self.width(), dump.as_deref_mut(), &self.name)?;
        let value = self.decode(bytes);
        if let Some(dump) = dump {
            dump.record_value(&self.name, offset, value.clone(), bytes);
        }
        Ok(value)
    }

    fn calcsize(&self) -> Result<usize> {
        Ok(self.width())
    }

    fn nbytes(&self, _value: &Value) -> Result<usize> {
        Ok(self.width())
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for ScalarType {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        ScalarType::parse(s, Endian::Little)
            .ok_or_else(|| LayoutError::construction(s, "not a scalar type name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_carry_byte_order() {
        assert_eq!(ScalarType::new(ScalarKind::U16, Endian::Little).type_name(), "UInt16");
        assert_eq!(ScalarType::new(ScalarKind::U16, Endian::Big).type_name(), "UInt16BE");
        assert_eq!(ScalarType::new(ScalarKind::U8, Endian::Big).type_name(), "UInt8");
        let parsed: ScalarType = "Int32BE".parse().unwrap();
        assert_eq!(parsed.kind(), ScalarKind::I32);
        assert_eq!(parsed.endian(), Endian::Big);
        assert_eq!(ScalarType::parse("Float32", Endian::Big).unwrap().type_name(), "Float32BE");
        assert!("UInt12".parse::<ScalarType>().is_err());
    }

    #[test]
    fn packs_both_byte_orders() {
        let value = Value::UInt(0x0102);
        let le = ScalarType::new(ScalarKind::U16, Endian::Little);
        let be = ScalarType::new(ScalarKind::U16, Endian::Big);
        assert_eq!(le.pack(&value).unwrap(), vec![0x02, 0x01]);
        assert_eq!(be.pack(&value).unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn build_range_checks() {
        let u8_ = ScalarType::new(ScalarKind::U8, Endian::Little);
        assert!(u8_.build(&json!(255)).is_ok());
        assert!(u8_.build(&json!(256)).is_err());
        assert!(u8_.build(&json!(-1)).is_err());
        assert!(u8_.build(&json!(1.5)).is_err());
        assert!(u8_.build(&json!("1")).is_err());

        let i8_ = ScalarType::new(ScalarKind::I8, Endian::Little);
        assert_eq!(i8_.build(&json!(5)).unwrap(), Value::Int(5));
        assert!(i8_.build(&json!(-129)).is_err());

        let f32_ = ScalarType::new(ScalarKind::F32, Endian::Little);
        assert_eq!(f32_.build(&json!(2)).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn unpack_records_value() {
        let ty = ScalarType::new(ScalarKind::I16, Endian::Big);
        let data = [0xFF, 0xFE];
        let mut view = MemoryView::new(&data);
        let mut dump = Dump::new();
        let value = ty.unpack(&mut view, Some(&mut dump)).unwrap();
        assert_eq!(value, Value::Int(-2));
        let record = &dump.records()[0];
        assert_eq!(record.type_name, "Int16BE");
        assert_eq!(record.bytes, vec![0xFF, 0xFE]);
    }

    #[test]
    fn float_round_trip() {
        let ty = ScalarType::new(ScalarKind::F64, Endian::Little);
        let bytes = ty.pack(&Value::Float(-0.5)).unwrap();
        let mut view = MemoryView::new(&bytes);
        assert_eq!(ty.unpack(&mut view, None).unwrap(), Value::Float(-0.5));
    }
}
