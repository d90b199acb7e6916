//! Application layer for the Like service.

pub mod cascades;
pub mod command_handlers;
pub mod query_handlers;
