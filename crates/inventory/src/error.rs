//! Inventory failures.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use hotelsupply_core::{DomainError, ErrorCause};

/// Free capacity on `date` was below the requested quantity.
///
/// Raised for the first short date of a request; the caller may retry with other
/// dates or a smaller quantity.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InsufficientInventory {
    date: NaiveDate,
    requested: u32,
    available: u32,
    message: String,
    code: Option<i64>,
    #[source]
    source: Option<ErrorCause>,
}

impl InsufficientInventory {
    /// Code reported when none was attached (maps to HTTP 409).
    pub const DEFAULT_CODE: i64 = 409;

    pub fn new(date: NaiveDate, requested: u32, available: u32) -> Self {
        Self {
            date,
            requested,
            available,
            message: format!(
                "insufficient inventory on {date}: requested {requested}, available {available}"
            ),
            code: None,
            source: None,
        }
    }

    /// Replace the rendered description.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// Chain the underlying error that caused this failure.
    pub fn with_source<E>(self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.with_cause(Arc::new(source))
    }

    /// Chain an already shared cause.
    pub fn with_cause(mut self, cause: ErrorCause) -> Self {
        self.source = Some(cause);
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn requested(&self) -> u32 {
        self.requested
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<i64> {
        self.code
    }

    pub fn code_or_default(&self) -> i64 {
        self.code.unwrap_or(Self::DEFAULT_CODE)
    }

    pub fn cause(&self) -> Option<&ErrorCause> {
        self.source.as_ref()
    }
}

/// Errors returned by availability checks and reservation release.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Insufficient(#[from] InsufficientInventory),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
