//! gapscout: pre-market gap scanner.
//!
//! Turns intraday OHLCV history into indicators, a bounded confidence score,
//! an action classification and stop/target levels for every ticker in a
//! universe.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
