//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Arma las piezas en el orden correcto (fase Starting):
//!
//! 1. Valida la configuración
//! 2. Bind del listener
//! 3. Crea la cola acotada y lanza el pool de workers sobre ella
//! 4. Entrega todo al [`Dispatcher`]
//!
//! Si algo falla antes de `run`, no queda ningún thread vivo.

use super::dispatcher::{DispatchReport, Dispatcher};
use super::files::FileServer;
use super::shutdown::{ShutdownHandle, ShutdownToken};
use crate::config::Config;
use crate::error::ServerError;
use crate::metrics::ServerStats;
use crate::queue::BoundedQueue;
use crate::workers::WorkerPool;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tracing::info;

/// Servidor HTTP/1.0 de archivos listo para correr
pub struct Server {
    dispatcher: Dispatcher<TcpListener>,
    local_addr: SocketAddr,
}

impl Server {
    /// Fase Starting completa: después de esto los workers ya esperan trabajo
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        config.validate()?;

        let address = config.address();
        let bind_error = |source| ServerError::Bind {
            addr: address.clone(),
            source,
        };
        let listener = TcpListener::bind(&address).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let stats = Arc::new(ServerStats::new());
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let files = FileServer::new(&config.serve_dir).with_io_timeout(config.io_timeout());

        let pool = WorkerPool::spawn(
            config.workers,
            Arc::clone(&queue),
            Arc::new(files),
            Arc::clone(&stats),
        )?;

        info!(
            addr = %local_addr,
            serve_dir = %config.serve_dir.display(),
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "listening"
        );

        Ok(Self {
            dispatcher: Dispatcher::new(listener, queue, pool, ShutdownToken::new(), stats),
            local_addr,
        })
    }

    /// Dirección real (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.dispatcher.shutdown_handle()
    }

    /// Bloquea hasta que se pida el shutdown y termine el drenado
    pub fn run(self) -> Result<DispatchReport, ServerError> {
        self.dispatcher.run()
    }
}
