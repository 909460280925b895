//! Optional generative-AI helpers: category suggestions and receipt
//! extraction. Nothing in the core depends on them succeeding.

mod gemini;

use std::{fs, path::Path};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::AssistantConfig;
use crate::domain::{Category, CategoryCatalog};

pub use gemini::GeminiAssistant;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("assistant is disabled")]
    Disabled,
    #[error("assistant request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("assistant response was malformed: {0}")]
    Malformed(String),
    #[error("assistant had no usable suggestion")]
    NoSuggestion,
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Receipt photo handed to [`ExpenseAssistant::extract_receipt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReceiptImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Reads an image file, inferring the MIME type from its extension.
    pub fn from_path(path: &Path) -> Result<Self, AssistError> {
        let mime_type = mime_for_path(path).ok_or_else(|| {
            AssistError::UnsupportedImage(format!(
                "{} (expected jpg, png, webp, heic or heif)",
                path.display()
            ))
        })?;
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Err(AssistError::UnsupportedImage(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(Self::new(bytes, mime_type))
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// Fields recovered from a receipt. Each one is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptExtraction {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

impl ReceiptExtraction {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.amount.is_none() && self.date.is_none()
    }
}

/// Capability interface for the external assistant.
pub trait ExpenseAssistant {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    /// Suggests a category for free-text `description`, drawn from `catalog`.
    fn categorize(
        &self,
        description: &str,
        catalog: &CategoryCatalog,
    ) -> Result<Category, AssistError>;

    fn extract_receipt(&self, image: &ReceiptImage) -> Result<ReceiptExtraction, AssistError>;
}

/// Stand-in used when no assistant is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAssistant;

impl ExpenseAssistant for DisabledAssistant {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn categorize(&self, _: &str, _: &CategoryCatalog) -> Result<Category, AssistError> {
        Err(AssistError::Disabled)
    }

    fn extract_receipt(&self, _: &ReceiptImage) -> Result<ReceiptExtraction, AssistError> {
        Err(AssistError::Disabled)
    }
}

/// Asks for a category and falls back to `Other` on any failure or on an
/// answer outside the catalog.
pub fn categorize_or_default(
    assistant: &dyn ExpenseAssistant,
    description: &str,
    catalog: &CategoryCatalog,
) -> Category {
    match assistant.categorize(description, catalog) {
        Ok(category) if catalog.contains(&category) => category,
        Ok(category) => {
            tracing::warn!(%category, "assistant suggested an unknown category");
            Category::other()
        }
        Err(err) => {
            tracing::warn!(error = %err, "categorization failed; using default");
            Category::other()
        }
    }
}

/// Builds the assistant described by `config`, or [`DisabledAssistant`] when
/// it is switched off or has no API key.
pub fn from_config(config: &AssistantConfig) -> Box<dyn ExpenseAssistant> {
    if !config.enabled {
        return Box::new(DisabledAssistant);
    }
    let Some(api_key) = config.resolve_api_key() else {
        tracing::warn!(
            env = %config.api_key_env,
            "no assistant API key set; receipt scanning and suggestions are disabled"
        );
        return Box::new(DisabledAssistant);
    };
    match GeminiAssistant::new(config, api_key) {
        Ok(assistant) => Box::new(assistant),
        Err(err) => {
            tracing::error!(error = %err, "failed to build assistant client");
            Box::new(DisabledAssistant)
        }
    }
}
