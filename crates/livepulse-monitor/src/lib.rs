//! Client for the external live-monitoring service.
//!
//! The service watches a streamer's live session and reports computed
//! engagement metrics per polling tick. This crate only speaks its HTTP API;
//! the payload types live in [`livepulse_core::live`].

pub mod client;
pub mod error;

pub use client::MonitorClient;
pub use error::MonitorError;
