//! Event-driven index synchronization.
//!
//! Submissions land on a bounded queue and are acknowledged immediately; a
//! single dispatcher task applies them to the document store in arrival
//! order. Backpressure is surfaced to submitters as `QueueFull` rather than
//! by blocking the acknowledgment path.

mod dispatcher;
mod handlers;
mod queue;

pub use dispatcher::Dispatcher;
pub use handlers::SyncHandler;
pub use queue::EventQueue;
