//! Core library for the triangle-arb-monitor project.
//!
//! The arbitrage math in [`arbitrage`] is pure and synchronous. Price
//! feeds, the polling loop, analytics and export are layered around it.

pub mod aggregator;
pub mod analytics;
pub mod arbitrage;
pub mod config;
pub mod errors;
pub mod export;
pub mod feeds;
pub mod models;
pub mod utils;
