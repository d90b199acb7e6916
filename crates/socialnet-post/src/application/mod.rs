//! Application layer for the Post service.

pub mod cascades;
pub mod command_handlers;
pub mod query_handlers;
