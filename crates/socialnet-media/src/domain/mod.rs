//! Domain layer for the Media service.

pub mod commands;
pub mod entities;
