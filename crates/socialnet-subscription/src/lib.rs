//! SocialNet — Subscription service.
//!
//! Follower relationships between users. Following publishes
//! `subscription.created`, which the notification service turns into a
//! notification for the followed user.

pub mod application;
pub mod domain;
