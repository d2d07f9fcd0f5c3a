//! Contract failures.

use std::sync::Arc;

use thiserror::Error;

use hotelsupply_core::{DomainError, ErrorCause};

use crate::status::ContractStatus;

/// An operation was attempted while the contract was in a status that does not permit it.
///
/// Never retried: the precondition only changes through an explicit transition.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ContractStatusInvalid {
    operation: String,
    current: ContractStatus,
    accepted: Vec<ContractStatus>,
    message: String,
    code: Option<i64>,
    #[source]
    source: Option<ErrorCause>,
}

impl ContractStatusInvalid {
    /// Code reported when none was attached (maps to HTTP 400).
    pub const DEFAULT_CODE: i64 = 400;

    pub fn new(
        operation: impl Into<String>,
        current: ContractStatus,
        accepted: impl Into<Vec<ContractStatus>>,
    ) -> Self {
        let operation = operation.into();
        let accepted = accepted.into();
        let message = render_message(&operation, current, &accepted);
        Self {
            operation,
            current,
            accepted,
            message,
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

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn current(&self) -> ContractStatus {
        self.current
    }

    pub fn accepted(&self) -> &[ContractStatus] {
        &self.accepted
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

fn render_message(operation: &str, current: ContractStatus, accepted: &[ContractStatus]) -> String {
    let allowed = if accepted.is_empty() {
        "none".to_string()
    } else {
        accepted
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("cannot {operation} while contract is {current} (allowed: {allowed})")
}

/// Errors returned by contract command handling.
#[derive(Debug, Clone, Error)]
pub enum ContractError {
    #[error(transparent)]
    StatusInvalid(#[from] ContractStatusInvalid),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
