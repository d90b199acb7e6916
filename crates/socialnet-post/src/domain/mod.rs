//! Domain layer for the Post service.

pub mod commands;
pub mod entities;
