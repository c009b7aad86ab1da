//! Store domain: aggregates, value objects and the events they raise.
pub mod aggregates;
pub mod events;
pub mod payment;
pub mod value_objects;
