//! Core domain types and logic. No I/O happens here.

pub mod classifier;
pub mod config;
pub mod config_validation;
pub mod context;
pub mod error;
pub mod gap;
pub mod indicator;
pub mod ohlcv;
pub mod risk;
pub mod scanner;
pub mod scoring;
pub mod sentiment;
pub mod series;
pub mod session;
pub mod universe;
