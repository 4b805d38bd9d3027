//! Domain events.
//!
//! Aggregates describe every state change as an [`Event`]; once applied, the
//! change is recorded as an [`EventEnvelope`] in the aggregate's history.

pub mod envelope;
pub mod event;

pub use envelope::EventEnvelope;
pub use event::Event;
