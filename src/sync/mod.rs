//! Watermark reconciliation and the periodic notification loop.

pub mod notifier;
pub mod reconcile;
pub mod scheduler;

pub use notifier::{Notifier, TickReport};
pub use scheduler::Schedule;
