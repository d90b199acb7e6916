//! Domain layer for the Comment service.

pub mod commands;
pub mod entities;
