//! Infrastructure layer: persistence and command orchestration.

pub mod booking_store;
pub mod dispatcher;

#[cfg(test)]
mod integration_tests;
