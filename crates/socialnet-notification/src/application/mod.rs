//! Application layer for the Notification service.

pub mod cascades;
pub mod command_handlers;
pub mod event_handlers;
pub mod query_handlers;
