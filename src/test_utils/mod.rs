//! Consolidated test utilities for the W1000 to InfluxDB2 forwarder.
//!
//! Fixtures generate portal wire payloads (login page, login response,
//! curve arrays); mocks provide recording/failing sink and listener
//! implementations used by the facade tests.

#![cfg(test)]

pub mod fixtures;
pub mod mocks;
