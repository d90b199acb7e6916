//! SocialNet — User service.
//!
//! Owns user accounts. Deleting a user publishes `user.deleted`, the root
//! of the cascade that removes everything the user owns in other services.

pub mod application;
pub mod domain;
