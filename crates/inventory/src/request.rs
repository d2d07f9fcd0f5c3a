use serde::{Deserialize, Serialize};

use hotelsupply_core::{DateRange, DomainError, DomainResult, ValueObject};

/// A date range plus the number of rooms wanted on every date of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAvailabilityRequest")]
pub struct AvailabilityRequest {
    range: DateRange,
    quantity: u32,
    room_type: Option<String>,
}

#[derive(Deserialize)]
struct RawAvailabilityRequest {
    range: DateRange,
    quantity: u32,
    #[serde(default)]
    room_type: Option<String>,
}

impl TryFrom<RawAvailabilityRequest> for AvailabilityRequest {
    type Error = DomainError;

    fn try_from(raw: RawAvailabilityRequest) -> Result<Self, Self::Error> {
        let request = AvailabilityRequest::new(raw.range, raw.quantity)?;
        Ok(match raw.room_type {
            Some(room_type) => request.with_room_type(room_type),
            None => request,
        })
    }
}

impl ValueObject for AvailabilityRequest {}

impl AvailabilityRequest {
    pub fn new(range: DateRange, quantity: u32) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self {
            range,
            quantity,
            room_type: None,
        })
    }

    /// Only count blocks of this room type.
    pub fn with_room_type(mut self, room_type: impl Into<String>) -> Self {
        self.room_type = Some(room_type.into());
        self
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn room_type(&self) -> Option<&str> {
        self.room_type.as_deref()
    }
}
