//! Domain events.
//!
//! Events are facts: immutable, versioned, append-only. Domain crates define
//! their own typed events and implement [`Event`] for them.

pub mod event;

pub use event::Event;
