//! SocialNet API host.
//!
//! Hosts every service's HTTP surface in one process, wires the cascade
//! consumers to the shared event channel and optionally runs the orphan
//! sweep.

pub mod config;
pub mod consumers;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
