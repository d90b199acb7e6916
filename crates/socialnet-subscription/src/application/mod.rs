//! Application layer for the Subscription service.

pub mod cascades;
pub mod command_handlers;
pub mod query_handlers;
