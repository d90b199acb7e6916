//! SocialNet — Media service.
//!
//! Media rows describe objects held in object storage. Every path that
//! removes a row, including the cascades on `user.deleted` and
//! `post.deleted`, removes the stored object as well.

pub mod application;
pub mod domain;
