//! SocialNet Core — shared propagation abstractions.
//!
//! This crate defines the traits and types every service depends on: entity
//! kinds, domain events and their envelope, the event channel contract, the
//! local store and object storage collaborators, existence checks, and the
//! static cascade graph. It contains no infrastructure code.

pub mod channel;
pub mod clock;
pub mod entity;
pub mod error;
pub mod event;
pub mod existence;
pub mod graph;
pub mod handler;
pub mod store;
