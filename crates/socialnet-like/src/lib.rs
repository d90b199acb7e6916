//! SocialNet — Like service.
//!
//! Holds likes on posts and likes on comments as two separate tables, and
//! answers the derived like counts. A user likes a given post or comment at
//! most once.

pub mod application;
pub mod domain;
