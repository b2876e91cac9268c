//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Contadores compartidos por el dispatcher y los workers. Son sólo
//! observacionales: nada del control de flujo depende de ellos.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Máximo de latencias a guardar (para calcular percentiles)
const MAX_LATENCIES: usize = 10_000;

/// Resultado de atender una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 200 enviado completo
    Served,
    /// 404 (inexistente, directorio o fuera del root)
    NotFound,
    /// 400 / 501
    BadRequest,
    /// Error de I/O a mitad de camino
    Failed,
    /// El handler hizo panic
    Panicked,
}

/// Collector de métricas thread-safe
#[derive(Debug)]
pub struct ServerStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    served: AtomicU64,
    not_found: AtomicU64,
    bad_request: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,

    /// Workers atendiendo una conexión en este momento
    busy_workers: AtomicU64,

    /// Últimas latencias registradas (en microsegundos)
    latencies: Mutex<VecDeque<u64>>,

    start_time: Instant,
}

impl ServerStats {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            served: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            bad_request: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
            busy_workers: AtomicU64::new(0),
            latencies: Mutex::new(VecDeque::with_capacity(MAX_LATENCIES)),
            start_time: Instant::now(),
        }
    }

    /// Conexión aceptada por el dispatcher
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Conexión descartada porque la cola ya estaba cerrada
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Un worker tomó una conexión
    pub fn worker_busy(&self) {
        self.busy_workers.fetch_add(1, Ordering::Relaxed);
    }

    /// Registra el resultado de una conexión y libera el worker
    pub fn record_outcome(&self, outcome: Outcome, latency: Duration) {
        let counter = match outcome {
            Outcome::Served => &self.served,
            Outcome::NotFound => &self.not_found,
            Outcome::BadRequest => &self.bad_request,
            Outcome::Failed => &self.failed,
            Outcome::Panicked => &self.panicked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.busy_workers.fetch_sub(1, Ordering::Relaxed);

        let mut latencies = self.latencies.lock().unwrap_or_else(PoisonError::into_inner);
        // Si tenemos demasiadas latencias, eliminar las más antiguas
        if latencies.len() >= MAX_LATENCIES {
            latencies.pop_front();
        }
        latencies.push_back(latency.as_micros() as u64);
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> StatsSnapshot {
        let latencies = self.latencies.lock().unwrap_or_else(PoisonError::into_inner);
        let latency_us = LatencySummary::from_samples(latencies.iter().copied());

        StatsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            served: self.served.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            bad_request: self.bad_request.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            busy_workers: self.busy_workers.load(Ordering::Relaxed),
            latency_us,
        }
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Foto de las métricas en un instante
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub served: u64,
    pub not_found: u64,
    pub bad_request: u64,
    pub failed: u64,
    pub panicked: u64,
    pub busy_workers: u64,
    pub latency_us: LatencySummary,
}

impl StatsSnapshot {
    /// Conexiones que algún worker terminó de procesar
    pub fn completed(&self) -> u64 {
        self.served + self.not_found + self.bad_request + self.failed + self.panicked
    }

    /// Obtiene las métricas en formato JSON
    pub fn to_json(&self) -> String {
        // Serializar un struct plano con tipos primitivos no puede fallar
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Percentiles de latencia
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub avg: u64,
    pub samples: usize,
}

impl LatencySummary {
    fn from_samples(samples: impl Iterator<Item = u64>) -> Self {
        let mut sorted: Vec<u64> = samples.collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_unstable();

        let len = sorted.len();
        let sum: u64 = sorted.iter().sum();

        Self {
            p50: sorted[len * 50 / 100],
            p95: sorted[len * 95 / 100],
            p99: sorted[len * 99 / 100],
            avg: sum / len as u64,
            samples: len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let snapshot = ServerStats::new().snapshot();
        assert_eq!(snapshot.accepted, 0);
        assert_eq!(snapshot.completed(), 0);
        assert_eq!(snapshot.latency_us, LatencySummary::default());
    }

    #[test]
    fn test_record_outcomes() {
        let stats = ServerStats::new();
        let outcomes = [
            Outcome::Served,
            Outcome::Served,
            Outcome::NotFound,
            Outcome::BadRequest,
            Outcome::Failed,
            Outcome::Panicked,
        ];

        for outcome in outcomes {
            stats.record_accepted();
            stats.worker_busy();
            stats.record_outcome(outcome, Duration::from_micros(100));
        }
        stats.record_rejected();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.accepted, 6);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.served, 2);
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.bad_request, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.panicked, 1);
        assert_eq!(snapshot.completed(), 6);
        assert_eq!(snapshot.busy_workers, 0);
        assert_eq!(snapshot.latency_us.samples, 6);
        assert_eq!(snapshot.latency_us.avg, 100);
    }

    #[test]
    fn test_percentiles() {
        let summary = LatencySummary::from_samples((1..=100).rev());
        assert_eq!(summary.p50, 51);
        assert_eq!(summary.p95, 96);
        assert_eq!(summary.p99, 100);
        assert_eq!(summary.avg, 50);
        assert_eq!(summary.samples, 100);
    }

    #[test]
    fn test_latency_window_is_bounded() {
        let stats = ServerStats::new();
        for _ in 0..MAX_LATENCIES + 10 {
            stats.worker_busy();
            stats.record_outcome(Outcome::Served, Duration::from_micros(1));
        }
        assert_eq!(stats.snapshot().latency_us.samples, MAX_LATENCIES);
    }

    #[test]
    fn test_snapshot_json() {
        let stats = ServerStats::new();
        stats.record_accepted();

        let json: serde_json::Value = serde_json::from_str(&stats.snapshot().to_json()).unwrap();
        assert_eq!(json["accepted"], 1);
        assert_eq!(json["latency_us"]["samples"], 0);
    }
}
