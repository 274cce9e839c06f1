//! The codec contract and the top-level entry points.
//!
//! Every layout family implements [`Codec`]. The free functions in this
//! module wrap a single top-level call: they own the [`MemoryView`] and the
//! [`Dump`], and only they check for bytes left over after decoding.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::dump::Dump;
use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::memory::MemoryView;
use crate::value::Value;

/// Build, pack, unpack and size values of one layout.
pub trait Codec {
    /// Name used in dumps and error messages.
    fn type_name(&self) -> &str;

    /// Construct a value from plain nested data.
    fn build(&self, data: &JsonValue) -> Result<Value>;

    /// Append the byte representation of `value` to `out`.
    fn pack_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<()>;

    /// The byte representation of `value`.
    fn pack(&self, value: &Value) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.nbytes(value).unwrap_or(0));
        self.pack_into(value, &mut out)?;
        Ok(out)
    }

    /// Decode exactly one instance from `view`.
    ///
    /// Every field attempted is recorded in `dump`, including the one that
    /// runs out of bytes.
    fn unpack(&self, view: &mut MemoryView<'_>, dump: Option<&mut Dump>) -> Result<Value>;

    /// Size of every instance, when it does not depend on content.
    fn calcsize(&self) -> Result<usize>;

    /// Size of the packed form of `value`.
    fn nbytes(&self, value: &Value) -> Result<usize>;
}

/// Encode `value` with `layout`.
pub fn pack(layout: &Layout, value: &Value) -> Result<Vec<u8>> {
    layout.pack(value)
}

/// Encode `value` and trace the encoded bytes by decoding them again.
pub fn pack_and_dump(layout: &Layout, value: &Value) -> Result<(Vec<u8>, Dump)> {
    let bytes = layout.pack(value)?;
    let (_, dump) = unpack_and_dump(layout, &bytes)?;
    Ok((bytes, dump))
}

/// Decode one value of `layout` that must span all of `bytes`.
///
/// A failed decode is repeated with a dump so the returned error always
/// carries the trace of how far decoding got.
pub fn unpack(layout: &Layout, bytes: &[u8]) -> Result<Value> {
    match decode(layout, bytes, None) {
        Ok(value) => Ok(value),
        Err(err) if err.is_decode_error() => {
            let mut dump = Dump::new();
            match decode(layout, bytes, Some(&mut dump)) {
                Ok(value) => Ok(value),
                Err(err) => Err(err.with_dump(dump)),
            }
        }
        Err(err) => Err(err),
    }
}

/// Decode one value of `layout` and return it with its dump.
pub fn unpack_and_dump(layout: &Layout, bytes: &[u8]) -> Result<(Value, Dump)> {
    unpack_and_dump_rooted(layout, bytes, Dump::new())
}

/// [`unpack_and_dump`] into a caller-supplied (usually re-rooted) dump.
pub fn unpack_and_dump_rooted(layout: &Layout, bytes: &[u8], mut dump: Dump) -> Result<(Value, Dump)> {
    match decode(layout, bytes, Some(&mut dump)) {
        Ok(value) => Ok((value, dump)),
        Err(err) => Err(err.with_dump(dump)),
    }
}

/// Static size of `layout`.
pub fn calcsize(layout: &Layout) -> Result<usize> {
    layout.calcsize()
}

/// Packed size of `value` under `layout`.
pub fn nbytes(layout: &Layout, value: &Value) -> Result<usize> {
    layout.nbytes(value)
}

fn decode(layout: &Layout, bytes: &[u8], mut dump: Option<&mut Dump>) -> Result<Value> {
    let mut view = MemoryView::new(bytes);
    let value = layout
        .unpack(&mut view, dump.as_deref_mut())
        .inspect_err(|err| {
            debug!(type_name = layout.type_name(), offset = view.offset(), error = %err, "decode failed");
        })?;

    let unconsumed = view.unconsumed();
    if unconsumed > 0 {
        if let Some(dump) = dump {
            dump.record_excess(view.offset(), view.remaining());
        }
        debug!(type_name = layout.type_name(), unconsumed, "excess bytes after decode");
        return Err(LayoutError::ExcessMemory {
            unconsumed,
            consumed: view.consumed(),
            available: bytes.len(),
            dump: None,
        });
    }
    Ok(value)
}
