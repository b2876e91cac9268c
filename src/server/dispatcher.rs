//! # Dispatcher (Productor)
//! src/server/dispatcher.rs
//!
//! ```text
//! Starting --> Accepting --(token cancelado | accept fatal)--> Draining --> Stopped
//! ```
//!
//! - **Starting**: bind y spawn de workers; lo hace quien construye el
//!   dispatcher (ver [`super::Server::bind`]).
//! - **Accepting**: `accept` -> `enqueue`. `Interrupted` se reintenta.
//! - **Draining**: se cierra el listener, después la cola (los workers
//!   bloqueados en `dequeue` despiertan), y se hace join de todos.
//! - **Stopped**: `run` retorna; la cola se libera con el último `Arc`.

use super::listener::{is_transient, Listener};
use super::shutdown::{ShutdownHandle, ShutdownToken};
use crate::error::ServerError;
use crate::metrics::{ServerStats, StatsSnapshot};
use crate::queue::BoundedQueue;
use crate::workers::{PoolReport, WorkerPool};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Resumen de una ejecución completa
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub pool: PoolReport,
    pub stats: StatsSnapshot,
}

/// Productor único de la cola de conexiones
pub struct Dispatcher<L: Listener> {
    listener: L,
    queue: Arc<BoundedQueue<L::Conn>>,
    pool: WorkerPool,
    token: ShutdownToken,
    stats: Arc<ServerStats>,
}

impl<L: Listener> Dispatcher<L> {
    /// Arma el dispatcher sobre un pool ya lanzado que consume `queue`
    pub fn new(
        listener: L,
        queue: Arc<BoundedQueue<L::Conn>>,
        pool: WorkerPool,
        token: ShutdownToken,
        stats: Arc<ServerStats>,
    ) -> Self {
        Self {
            listener,
            queue,
            pool,
            token,
            stats,
        }
    }

    /// Handle para pedir el shutdown desde otro thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.token.clone(), self.listener.wake_addr())
    }

    /// Corre Accepting y Draining
    ///
    /// Un error fatal de `accept` también pasa por Draining antes de
    /// retornar, así ningún worker queda colgado.
    pub fn run(self) -> Result<DispatchReport, ServerError> {
        info!(
            workers = self.pool.size(),
            capacity = self.queue.capacity(),
            "accepting connections"
        );
        let accepted = self.accept_loop();

        // === Draining ===
        let Self {
            listener,
            queue,
            pool,
            stats,
            ..
        } = self;

        drop(listener);
        info!(pending = queue.len(), "draining: listener closed, shutting down queue");

        // Antes del join: los workers en dequeue sólo despiertan así
        queue.shutdown();
        let joined = pool.join();

        // === Stopped ===
        let snapshot = stats.snapshot();
        info!(served = snapshot.served, failed = snapshot.failed, "dispatcher stopped");

        accepted?;
        Ok(DispatchReport {
            pool: joined?,
            stats: snapshot,
        })
    }

    fn accept_loop(&self) -> Result<(), ServerError> {
        while !self.token.is_cancelled() {
            let conn = match self.listener.accept() {
                Ok(conn) => conn,
                Err(err) if is_transient(&err) => {
                    trace!(%err, "accept interrupted, retrying");
                    continue;
                }
                Err(err) => {
                    error!(%err, "accept failed");
                    return Err(ServerError::Accept(err));
                }
            };

            // La conexión de despertar (o un cliente que llegó tarde)
            if self.token.is_cancelled() {
                debug!("discarding connection accepted after shutdown request");
                break;
            }

            self.stats.record_accepted();
            if let Err(rejected) = self.queue.enqueue(conn) {
                debug!("queue closed, dropping connection");
                self.stats.record_rejected();
                drop(rejected.into_inner());
                break;
            }
        }

        Ok(())
    }
}
