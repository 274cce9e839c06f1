//! Cursor over a byte buffer with scoped byte budgets.
//!
//! A [`MemoryView`] hands out bytes front to back. Nested decodes may be
//! bounded with [`MemoryView::limit`], which pushes a budget onto a LIFO
//! stack; the returned [`LimitGuard`] pops it again when dropped, so the
//! budget is released on every exit path including `?` propagation.

use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::dump::Dump;
use crate::error::{LayoutError, Result};

/// A read cursor over a byte buffer.
///
/// The cursor only moves forward and never passes the end of the buffer.
#[derive(Debug)]
pub struct MemoryView<'a> {
    buffer: &'a [u8],
    offset: usize,
    /// Absolute end offsets of the active limits, innermost last.
    limits: Vec<usize>,
}

impl<'a> MemoryView<'a> {
    /// Create a view positioned at the start of `buffer`, with no limit.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            limits: Vec::new(),
        }
    }

    /// Current cursor position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes consumed so far (same as the cursor position).
    pub fn consumed(&self) -> usize {
        self.offset
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of limits currently active.
    pub fn depth(&self) -> usize {
        self.limits.len()
    }

    fn end(&self) -> usize {
        self.limits.last().copied().unwrap_or(self.buffer.len())
    }

    /// Bytes remaining under the innermost limit (or to the end of the buffer).
    pub fn available(&self) -> usize {
        self.end() - self.offset
    }

    /// The bytes remaining under the innermost limit, without consuming them.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buffer[self.offset..self.end()]
    }

    /// Bytes left between the cursor and the end of the buffer, ignoring limits.
    ///
    /// Only the top-level decode checks this; a positive value there is an
    /// [`LayoutError::ExcessMemory`].
    pub fn unconsumed(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Return the next `n` bytes and advance the cursor.
    ///
    /// Fails without moving the cursor when fewer than `n` bytes remain under
    /// the active limit.
    pub fn consume(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.available();
        if n > available {
            return Err(LayoutError::insufficient(n - available));
        }
        let start = self.offset;
        self.offset += n;
        Ok(&self.buffer[start..self.offset])
    }

    /// [`consume`](Self::consume) on behalf of a field being traced.
    ///
    /// On a shortfall the partial bytes are recorded in `dump` as an
    /// insufficient-bytes placeholder for `type_name` before the error
    /// propagates.
    pub fn consume_field(
        &mut self,
        n: usize,
        dump: Option<&mut Dump>,
        type_name: &str,
    ) -> Result<&'a [u8]> {
        let offset = self.offset;
        match self.consume(n) {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                if let (Some(dump), LayoutError::InsufficientMemory { shortfall, .. }) =
                    (dump, &err)
                {
                    dump.record_shortfall(type_name, offset, self.remaining(), *shortfall);
                }
                Err(err)
            }
        }
    }

    /// Restrict consumption to at most `nbytes` until the guard is dropped.
    ///
    /// The new budget must fit in what is available under the current one.
    pub fn limit(&mut self, nbytes: usize) -> Result<LimitGuard<'_, 'a>> {
        let available = self.available();
        if nbytes > available {
            return Err(LayoutError::insufficient(nbytes - available));
        }
        self.limits.push(self.offset + nbytes);
        trace!(offset = self.offset, nbytes, depth = self.limits.len(), "limit pushed");
        Ok(LimitGuard { view: self })
    }

    /// Run `f` with consumption restricted to at most `nbytes`.
    pub fn with_limit<T>(
        &mut self,
        nbytes: usize,
        f: impl FnOnce(&mut MemoryView<'a>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.limit(nbytes)?;
        f(&mut *guard)
    }
}

/// An active byte budget on a [`MemoryView`]; popped on drop.
#[derive(Debug)]
pub struct LimitGuard<'v, 'a> {
    view: &'v mut MemoryView<'a>,
}

impl<'a> Deref for LimitGuard<'_, 'a> {
    type Target = MemoryView<'a>;

    fn deref(&self) -> &Self::Target {
        self.view
    }
}

impl DerefMut for LimitGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.view
    }
}

impl Drop for LimitGuard<'_, '_> {
    fn drop(&mut self) {
        self.view.limits.pop();
        trace!(
            offset = self.view.offset,
            depth = self.view.limits.len(),
            "limit popped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::DumpValue;

    #[test]
    fn consume_advances_cursor() {
        let data = [1, 2, 3, 4];
        let mut view = MemoryView::new(&data);
        assert_eq!(view.consume(2).unwrap(), &[1, 2]);
        assert_eq!(view.offset(), 2);
        assert_eq!(view.available(), 2);
        assert_eq!(view.consume(2).unwrap(), &[3, 4]);
        assert_eq!(view.unconsumed(), 0);
    }

    #[test]
    fn shortfall_leaves_cursor_in_place() {
        let data = [1, 2, 3];
        let mut view = MemoryView::new(&data);
        view.consume(1).unwrap();
        let err = view.consume(4).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InsufficientMemory { shortfall: 2, .. }
        ));
        assert_eq!(view.offset(), 1);
    }

    #[test]
    fn limit_bounds_consumption() {
        let data = [0u8; 8];
        let mut view = MemoryView::new(&data);
        {
            let mut scoped = view.limit(3).unwrap();
            assert_eq!(scoped.available(), 3);
            assert!(scoped.consume(4).is_err());
            scoped.consume(2).unwrap();
            assert_eq!(scoped.available(), 1);
        }
        assert_eq!(view.depth(), 0);
        assert_eq!(view.available(), 6);
    }

    #[test]
    fn limits_nest_within_parent_budget() {
        let data = [0u8; 8];
        let mut view = MemoryView::new(&data);
        let result = view.with_limit(4, |outer| {
            assert!(outer.limit(5).is_err());
            outer.with_limit(2, |inner| {
                assert_eq!(inner.depth(), 2);
                inner.consume(2).map(|_| ())
            })?;
            assert_eq!(outer.available(), 2);
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(view.depth(), 0);
    }

    #[test]
    fn limit_released_on_error() {
        let data = [0u8; 8];
        let mut view = MemoryView::new(&data);
        let result: Result<()> = view.with_limit(2, |inner| inner.consume(3).map(|_| ()));
        assert!(result.is_err());
        assert_eq!(view.depth(), 0);
        assert_eq!(view.available(), 8);
    }

    #[test]
    fn consume_field_records_placeholder() {
        let data = [0xAA];
        let mut view = MemoryView::new(&data);
        let mut dump = Dump::new();
        assert!(view.consume_field(2, Some(&mut dump), "UInt16").is_err());
        let record = &dump.records()[0];
        assert_eq!(record.type_name, "UInt16");
        assert_eq!(record.bytes, vec![0xAA]);
        assert_eq!(record.value, DumpValue::Insufficient { shortfall: 1 });
    }
}
