//! SocialNet — Notification service.
//!
//! Notifications are created from events rather than commands: a new
//! subscription notifies the followed user. They are removed when either
//! the recipient or the actor is deleted.

pub mod application;
pub mod domain;
