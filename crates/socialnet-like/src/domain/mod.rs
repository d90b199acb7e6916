//! Domain layer for the Like service.

pub mod commands;
pub mod entities;
