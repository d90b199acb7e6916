//! Application layer for the User service.

pub mod command_handlers;
pub mod query_handlers;
