//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Recolección de métricas del servidor:
//! - Conexiones aceptadas / rechazadas
//! - Resultado de cada conexión (200, 404, 400/501, error, panic)
//! - Workers ocupados
//! - Latencias (p50, p95, p99)

pub mod collector;

pub use collector::{LatencySummary, Outcome, ServerStats, StatsSnapshot};
