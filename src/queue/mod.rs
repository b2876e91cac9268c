//! # Cola de Conexiones
//! src/queue/mod.rs
//!
//! Punto de encuentro entre el dispatcher y el pool de workers.

pub mod bounded;

pub use bounded::{BoundedQueue, EnqueueError, QueueClosed, QueueStats};
