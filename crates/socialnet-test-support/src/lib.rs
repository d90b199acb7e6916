//! Shared test mocks and utilities for the SocialNet services.

mod channel;
mod clock;
mod existence;
mod handler;
mod store;

pub use channel::{FailingChannel, FlakyChannel};
pub use clock::FixedClock;
pub use existence::{FailingExistenceChecker, SlowExistenceChecker, StaticExistenceChecker};
pub use handler::ScriptedHandler;
pub use store::{FailingStore, LateInsertStore, YieldingStore};
