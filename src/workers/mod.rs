//! # Workers
//! src/workers/mod.rs
//!
//! Pool de tamaño fijo que consume conexiones de la cola compartida y se
//! las pasa al colaborador que escribe la respuesta.

pub mod pool;

pub use pool::{ConnectionHandler, PoolReport, WorkerPool};
