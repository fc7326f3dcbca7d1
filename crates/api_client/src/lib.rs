//! Client for the conference planner backend API
//!
//! One HTTP client is bound to the configured `serviceUrl` and shared by the
//! request handlers. Relative paths resolve against that base address.

pub mod client;
pub mod health;

pub use client::*;
pub use health::*;
