//! Session service for the lending dashboard.
//!
//! This crate wraps the pure accounting core in a stateful service:
//! - Shared pool state and per-wallet positions, loans and collateral
//! - Pending to confirmed transitions for every user action
//! - One in-flight operation per wallet and action kind
//! - Lifecycle event history per wallet
//! - Environment-driven configuration

/// Prelude module for convenient imports.
pub mod prelude;

/// Configuration.
pub mod config;
/// Confirmation of submitted operations.
pub mod confirmation;
/// Error types.
pub mod error;
/// Lifecycle event tracking.
pub mod lifecycle;
/// Lending service and sessions.
pub mod service;
