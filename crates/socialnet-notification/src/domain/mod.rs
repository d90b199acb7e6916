//! Domain layer for the Notification service.

pub mod commands;
pub mod entities;
