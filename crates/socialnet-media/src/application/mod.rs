//! Application layer for the Media service.

pub mod cascades;
pub mod command_handlers;
pub mod query_handlers;
