//! Layout errors.
//!
//! Decoding fails in exactly two shapes: a consume that asks for more bytes
//! than the active limit allows, and leftover bytes after the outermost
//! decode. Construction and static-size requests have their own variants.

use thiserror::Error;

use crate::dump::Dump;

/// Convenience alias for results within the core crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors raised while building, packing, sizing or unpacking layouts.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A consume asked for more bytes than remain under the active limit.
    #[error("{shortfall} too few bytes to unpack")]
    InsufficientMemory {
        shortfall: usize,
        dump: Option<Box<Dump>>,
    },

    /// The top-level decode finished with bytes left over.
    #[error("{unconsumed} unconsumed bytes ({consumed} of {available} consumed)")]
    ExcessMemory {
        unconsumed: usize,
        consumed: usize,
        available: usize,
        dump: Option<Box<Dump>>,
    },

    /// A static size was requested for a content-dependent layout.
    #[error("size of {type_name} varies: {reason}")]
    Size { type_name: String, reason: String },

    /// Plain data or a value does not fit the layout.
    #[error("invalid {type_name}: {message}")]
    Construction { type_name: String, message: String },
}

impl LayoutError {
    pub(crate) fn insufficient(shortfall: usize) -> Self {
        LayoutError::InsufficientMemory {
            shortfall,
            dump: None,
        }
    }

    pub(crate) fn size(type_name: &str, reason: impl Into<String>) -> Self {
        LayoutError::Size {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn construction(type_name: &str, message: impl Into<String>) -> Self {
        LayoutError::Construction {
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }

    /// The dump attached to a decode failure, if any.
    pub fn dump(&self) -> Option<&Dump> {
        match self {
            LayoutError::InsufficientMemory { dump, .. }
            | LayoutError::ExcessMemory { dump, .. } => dump.as_deref(),
            LayoutError::Size { .. } | LayoutError::Construction { .. } => None,
        }
    }

    /// Attach a dump to a decode failure. Other variants are returned as-is.
    pub fn with_dump(self, new_dump: Dump) -> Self {
        match self {
            LayoutError::InsufficientMemory { shortfall, .. } => LayoutError::InsufficientMemory {
                shortfall,
                dump: Some(Box::new(new_dump)),
            },
            LayoutError::ExcessMemory {
                unconsumed,
                consumed,
                available,
                ..
            } => LayoutError::ExcessMemory {
                unconsumed,
                consumed,
                available,
                dump: Some(Box::new(new_dump)),
            },
            other => other,
        }
    }

    /// Whether this error was raised while decoding bytes.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            LayoutError::InsufficientMemory { .. } | LayoutError::ExcessMemory { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_counts() {
        let err = LayoutError::insufficient(3);
        assert_eq!(err.to_string(), "3 too few bytes to unpack");

        let err = LayoutError::ExcessMemory {
            unconsumed: 1,
            consumed: 8,
            available: 9,
            dump: None,
        };
        assert_eq!(err.to_string(), "1 unconsumed bytes (8 of 9 consumed)");
    }

    #[test]
    fn dump_only_attaches_to_decode_errors() {
        let err = LayoutError::insufficient(1).with_dump(Dump::new());
        assert!(err.dump().is_some());
        assert!(err.is_decode_error());

        let err = LayoutError::size("UInt8[]", "open dimension").with_dump(Dump::new());
        assert!(err.dump().is_none());
        assert!(!err.is_decode_error());
    }
}
