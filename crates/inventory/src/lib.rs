//! Inventory domain module.
//!
//! Room-type capacity blocks owned by contracts, and the availability checker that
//! reserves capacity across a date range all-or-nothing. Pure domain logic (no IO).

pub mod availability;
pub mod block;
pub mod error;
pub mod request;

pub use availability::{
    Allocation, AllocationPlan, DailyAvailability, Reservation, check_availability,
    daily_availability, plan_allocation, release,
};
pub use block::{InventoryBlock, InventoryBlockId, ReservationId};
pub use error::{InsufficientInventory, InventoryError};
pub use request::AvailabilityRequest;
