//! # Errores del Servidor
//! src/error.rs
//!
//! Dos familias separadas:
//! - [`ServerError`]: fallas de arranque y fallas fatales del dispatcher.
//! - [`ServeError`]: fallas locales a una conexión; el worker las registra y
//!   sigue con la siguiente.
//!
//! Los errores de cola cerrada viven en [`crate::queue`] porque son flujo de
//! control, no anomalías.

use crate::config::ConfigError;
use crate::http::request::{ParseError, ReadError};
use crate::metrics::Outcome;
use std::io;
use std::path::PathBuf;

/// Errores de arranque o fatales para el proceso
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

/// Errores de una sola conexión
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("bad request: {0}")]
    BadRequest(#[from] ParseError),

    #[error("method not implemented: {0}")]
    NotImplemented(String),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
}

impl From<ReadError> for ServeError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Io(err) => ServeError::Io(err),
            ReadError::Parse(err) => ServeError::BadRequest(err),
        }
    }
}

impl ServeError {
    /// Clasificación para las métricas
    pub fn outcome(&self) -> Outcome {
        match self {
            ServeError::Io(_) => Outcome::Failed,
            ServeError::BadRequest(_) | ServeError::NotImplemented(_) => Outcome::BadRequest,
            ServeError::NotFound(_) => Outcome::NotFound,
        }
    }
}
