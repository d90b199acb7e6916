//! Domain layer for the Subscription service.

pub mod commands;
pub mod entities;
