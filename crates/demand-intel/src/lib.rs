//! Demand intelligence engine for the procurement marketplace back office.
//!
//! Detected demand signals are scored, classified, and routed to a decision
//! (auto-RFQ, admin review, ignore); approved signals are materialized into
//! internal sourcing requirements. Persistence is abstracted behind traits so
//! the service can run against in-memory stores in tests and demos.

pub mod access;
pub mod config;
pub mod error;
pub mod intelligence;
pub mod telemetry;
