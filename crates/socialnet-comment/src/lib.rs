//! SocialNet — Comment service.
//!
//! Comments hang off a post and are authored by a user; both references
//! are checked before a comment is written. Comments disappear when either
//! their post or their author is deleted.

pub mod application;
pub mod domain;
