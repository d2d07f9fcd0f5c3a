//! `hotelsupply-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod date_range;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use date_range::DateRange;
pub use entity::Entity;
pub use error::{DomainError, DomainResult, ErrorCause};
pub use id::AggregateId;
pub use value_object::ValueObject;
