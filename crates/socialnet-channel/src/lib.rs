//! SocialNet Channel — in-process partitioned event log.
//!
//! Implements the `EventChannel` contract for a single process: channels are
//! declared with a fixed partition count, records are routed by partition key,
//! and consumer groups track one committed offset per partition.

pub mod memory;
pub mod partition;

pub use memory::InMemoryChannel;
pub use partition::partition_for;
