//! Application layer for the Comment service.

pub mod cascades;
pub mod command_handlers;
pub mod query_handlers;
