//! Domain layer for the User service.

pub mod commands;
pub mod entities;
