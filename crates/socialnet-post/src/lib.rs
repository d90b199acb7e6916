//! SocialNet — Post service.
//!
//! Owns posts. Creating a post requires its author to exist in the user
//! service; deleting one publishes `post.deleted`. Posts of a deleted user
//! are removed by the cascade on `user.deleted`.

pub mod application;
pub mod domain;
