//! Room membership and broadcast coordination for the roomcast relay.
//!
//! This crate is the concurrency-sensitive core of the system: an in-memory
//! registry of ephemeral device connections partitioned into rooms
//! ([`registry::RoomRegistry`]) and the join/leave/disconnect lifecycle
//! manager that owns the live sessions ([`lifecycle::ConnectionManager`]).
//!
//! Nothing here performs I/O while holding a lock; broadcast sends are
//! non-blocking `try_send`s against per-connection queues, and membership
//! snapshots are taken under a brief guard and used afterwards.

pub mod lifecycle;
pub mod registry;

pub use lifecycle::ConnectionManager;
pub use registry::RoomRegistry;
