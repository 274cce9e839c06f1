//! Output formats shared by the dump views.

use std::str::FromStr;

use serde_json::Value;

use crate::error::ObserveError;

/// The output format for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFormat {
    #[default]
    Text,
    Json,
}

impl ViewFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ViewFormat::Text => "text",
            ViewFormat::Json => "json",
        }
    }
}

impl FromStr for ViewFormat {
    type Err = ObserveError;

    fn from_str(s: &str) -> Result<Self, ObserveError> {
        match s {
            "text" | "table" => Ok(ViewFormat::Text),
            "json" => Ok(ViewFormat::Json),
            _ => Err(ObserveError::UnknownFormat {
                name: s.to_string(),
            }),
        }
    }
}

/// The output of a view render.
#[derive(Debug)]
pub struct ViewOutput {
    /// Terminal-friendly text rendering.
    pub text: String,
    /// Machine-readable JSON (always populated).
    pub data: Value,
}

impl ViewOutput {
    /// Render in the requested format.
    pub fn render(&self, format: ViewFormat) -> String {
        match format {
            ViewFormat::Text => self.text.clone(),
            ViewFormat::Json => {
                serde_json::to_string_pretty(&self.data).unwrap_or_else(|_| "{}".to_string())
            }
        }
    }
}
