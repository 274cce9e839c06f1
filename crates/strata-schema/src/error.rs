//! Schema error types.

/// Errors that can occur while loading or resolving a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A type declaration is missing or misuses a parameter.
    #[error("invalid type `{name}`: {detail}")]
    InvalidType { name: String, detail: String },

    /// A declaration refers to a type that is neither built in nor declared earlier.
    #[error("type `{name}` references unknown type `{reference}`")]
    UnknownType { name: String, reference: String },

    /// Two declarations share a name, or a declaration shadows a built-in.
    #[error("duplicate type `{name}`")]
    DuplicateType { name: String },

    /// A lookup named no known type.
    #[error("no type named `{name}`")]
    NotFound { name: String },

    /// The layout builders rejected the declared parameters.
    #[error("layout error: {0}")]
    Layout(#[from] strata_core::LayoutError),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
