//! # Pool Fijo de Workers
//! src/workers/pool.rs
//!
//! N threads de vida larga comparten una misma [`BoundedQueue`]. Cada uno:
//!
//! ```text
//! Waiting-For-Work --dequeue Ok--> Processing --handle + drop--> Waiting-For-Work
//!        |
//!        +--dequeue QueueClosed--> Terminated (se puede hacer join)
//! ```
//!
//! Una falla del handler es local a esa conexión: se registra, la conexión
//! se libera igual y el worker vuelve a esperar. Nunca se reintenta.

use crate::error::{ServeError, ServerError};
use crate::metrics::{Outcome, ServerStats};
use crate::queue::{BoundedQueue, QueueClosed};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Colaborador que atiende una conexión completa (request + response)
///
/// Se invoca concurrentemente desde todos los workers, así que no debe
/// tener estado mutable compartido. El worker libera la conexión al
/// retornar, haya fallado o no.
pub trait ConnectionHandler<C>: Send + Sync + 'static {
    fn handle(&self, conn: &mut C) -> Result<(), ServeError>;
}

impl<C, F> ConnectionHandler<C> for F
where
    F: Fn(&mut C) -> Result<(), ServeError> + Send + Sync + 'static,
{
    fn handle(&self, conn: &mut C) -> Result<(), ServeError> {
        self(conn)
    }
}

struct Worker {
    id: usize,
    /// Retorna cuántas conexiones procesó
    handle: JoinHandle<usize>,
}

/// Conjunto fijo de workers consumiendo una cola compartida
///
/// Si se descarta sin `join`, cierra la cola para que los workers terminen
/// solos (quedan detached).
pub struct WorkerPool {
    workers: Vec<Worker>,

    /// `shutdown` de la cola, con el tipo de conexión borrado
    close_queue: Box<dyn Fn() + Send + Sync>,
}

impl WorkerPool {
    /// Lanza `size` workers sobre `queue`
    ///
    /// Si el sistema no puede crear algún thread, la cola se cierra, los
    /// workers que sí arrancaron se esperan y se retorna el error.
    pub fn spawn<C, H>(
        size: usize,
        queue: Arc<BoundedQueue<C>>,
        handler: Arc<H>,
        stats: Arc<ServerStats>,
    ) -> Result<Self, ServerError>
    where
        C: Send + 'static,
        H: ConnectionHandler<C>,
    {
        let mut workers = Vec::with_capacity(size);
        let close_queue: Box<dyn Fn() + Send + Sync> = {
            let queue = Arc::clone(&queue);
            Box::new(move || queue.shutdown())
        };

        for id in 0..size {
            let queue_ref = Arc::clone(&queue);
            let handler = Arc::clone(&handler);
            let stats = Arc::clone(&stats);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, &queue_ref, handler.as_ref(), &stats));

            match spawned {
                Ok(handle) => workers.push(Worker { id, handle }),
                Err(source) => {
                    error!(worker = id, %source, "failed to spawn worker");
                    close_queue();
                    let partial = Self {
                        workers,
                        close_queue,
                    };
                    if let Err(err) = partial.join() {
                        error!(%err, "while tearing down a partially started pool");
                    }
                    return Err(ServerError::Spawn { index: id, source });
                }
            }
        }

        info!(workers = size, "worker pool started");
        Ok(Self {
            workers,
            close_queue,
        })
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Espera a que todos los workers terminen
    ///
    /// Sólo retorna cuando la cola fue cerrada (si no, bloquea para
    /// siempre). Se hace join de **todos** aunque alguno haya hecho panic;
    /// en ese caso se reporta el primero.
    pub fn join(mut self) -> Result<PoolReport, ServerError> {
        let workers = std::mem::take(&mut self.workers);
        let mut processed = Vec::with_capacity(workers.len());
        let mut panicked = None;

        for worker in workers {
            match worker.handle.join() {
                Ok(count) => processed.push(count),
                Err(_) => {
                    error!(worker = worker.id, "worker thread panicked");
                    processed.push(0);
                    panicked.get_or_insert(worker.id);
                }
            }
        }

        match panicked {
            Some(id) => Err(ServerError::WorkerPanicked(id)),
            None => Ok(PoolReport { processed }),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        debug!(workers = self.workers.len(), "pool dropped without join, closing queue");
        (self.close_queue)();
    }
}

/// Resultado del join: conexiones procesadas por cada worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport {
    pub processed: Vec<usize>,
}

impl PoolReport {
    pub fn total(&self) -> usize {
        self.processed.iter().sum()
    }
}

/// Loop principal del worker
fn worker_loop<C, H>(
    id: usize,
    queue: &BoundedQueue<C>,
    handler: &H,
    stats: &ServerStats,
) -> usize
where
    H: ConnectionHandler<C> + ?Sized,
{
    debug!(worker = id, "worker started");
    let mut processed = 0;

    loop {
        // Waiting-For-Work
        let mut conn = match queue.dequeue() {
            Ok(conn) => conn,
            Err(QueueClosed) => break,
        };

        // Processing
        stats.worker_busy();
        let start = Instant::now();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&mut conn))) {
            Ok(Ok(())) => Outcome::Served,
            Ok(Err(err)) => {
                match &err {
                    ServeError::NotFound(_) => debug!(worker = id, %err, "connection failed"),
                    _ => warn!(worker = id, %err, "connection failed"),
                }
                err.outcome()
            }
            Err(_) => {
                error!(worker = id, "connection handler panicked");
                Outcome::Panicked
            }
        };

        // Liberar la conexión (cierra el socket) antes de volver a esperar
        drop(conn);
        stats.record_outcome(outcome, start.elapsed());
        processed += 1;
    }

    trace!(worker = id, processed, "queue closed, worker terminated");
    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    const DEADLINE: Duration = Duration::from_secs(5);

    /// Handle de prueba que cuenta cuántas veces fue liberado
    struct Tracked {
        id: u32,
        released: Arc<AtomicUsize>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tracked(ids: impl IntoIterator<Item = u32>, released: &Arc<AtomicUsize>) -> Vec<Tracked> {
        ids.into_iter()
            .map(|id| Tracked {
                id,
                released: Arc::clone(released),
            })
            .collect()
    }

    #[test]
    fn test_workers_terminate_on_shutdown_without_work() {
        let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new(4));
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &mut u32| -> Result<(), ServeError> {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };

        let stats = Arc::new(ServerStats::new());
        let pool = WorkerPool::spawn(3, Arc::clone(&queue), handler, stats).unwrap();
        assert_eq!(pool.size(), 3);

        queue.shutdown();

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || tx.send(pool.join()).unwrap());
        let report = rx.recv_timeout(DEADLINE).expect("workers must terminate").unwrap();

        assert_eq!(report.processed, vec![0, 0, 0]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_every_connection_processed_once_and_released() {
        let queue = Arc::new(BoundedQueue::new(2));
        let released = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handler = {
            let seen = Arc::clone(&seen);
            Arc::new(move |conn: &mut Tracked| -> Result<(), ServeError> {
                seen.lock().unwrap().push(conn.id);
                Ok(())
            })
        };
        let stats = Arc::new(ServerStats::new());
        let pool = WorkerPool::spawn(4, Arc::clone(&queue), handler, Arc::clone(&stats)).unwrap();

        for conn in tracked(0..100, &released) {
            queue.enqueue(conn).unwrap();
        }
        queue.shutdown();
        let report = pool.join().unwrap();

        assert_eq!(report.total(), 100);
        assert_eq!(released.load(Ordering::SeqCst), 100);

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
        assert_eq!(stats.snapshot().served, 100);
    }

    #[test]
    fn test_handler_failure_does_not_stop_worker() {
        let queue = Arc::new(BoundedQueue::new(8));
        let released = Arc::new(AtomicUsize::new(0));

        let handler = Arc::new(|conn: &mut Tracked| -> Result<(), ServeError> {
            if conn.id % 2 == 0 {
                Err(ServeError::NotFound(PathBuf::from(format!("/{}", conn.id))))
            } else {
                Err(ServeError::Io(std::io::Error::other("broken pipe")))
            }
        });
        let stats = Arc::new(ServerStats::new());

        // Un solo worker: si una falla lo matara, el resto quedaría sin procesar
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), handler, Arc::clone(&stats)).unwrap();
        for conn in tracked(0..6, &released) {
            queue.enqueue(conn).unwrap();
        }
        queue.shutdown();

        assert_eq!(pool.join().unwrap().processed, vec![6]);
        assert_eq!(released.load(Ordering::SeqCst), 6);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.not_found, 3);
        assert_eq!(snapshot.failed, 3);
        assert_eq!(snapshot.served, 0);
    }

    #[test]
    fn test_handler_panic_is_contained() {
        let queue = Arc::new(BoundedQueue::new(4));
        let released = Arc::new(AtomicUsize::new(0));

        let handler = Arc::new(|conn: &mut Tracked| -> Result<(), ServeError> {
            if conn.id == 1 {
                panic!("boom");
            }
            Ok(())
        });
        let stats = Arc::new(ServerStats::new());
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), handler, Arc::clone(&stats)).unwrap();

        for conn in tracked(0..3, &released) {
            queue.enqueue(conn).unwrap();
        }
        queue.shutdown();

        assert_eq!(pool.join().unwrap().total(), 3);
        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert_eq!(stats.snapshot().panicked, 1);
        assert_eq!(stats.snapshot().served, 2);
    }

    #[test]
    fn test_workers_drain_buffer_after_shutdown() {
        let queue = Arc::new(BoundedQueue::new(5));
        for i in 0..5u32 {
            queue.enqueue(i).unwrap();
        }
        queue.shutdown();

        let handler = Arc::new(|_: &mut u32| -> Result<(), ServeError> { Ok(()) });
        let stats = Arc::new(ServerStats::new());
        let pool = WorkerPool::spawn(2, Arc::clone(&queue), handler, stats).unwrap();

        assert_eq!(pool.join().unwrap().total(), 5);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dropping_pool_without_join_releases_workers() {
        let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new(2));
        let handler = Arc::new(|_: &mut u32| -> Result<(), ServeError> { Ok(()) });
        let stats = Arc::new(ServerStats::new());
        let pool = WorkerPool::spawn(3, Arc::clone(&queue), handler, stats).unwrap();
        assert!(!queue.is_shutdown());

        drop(pool);
        assert!(queue.is_shutdown());

        // Los workers terminan y sueltan sus referencias a la cola
        for _ in 0..500 {
            if Arc::strong_count(&queue) == 1 {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("workers never exited after the pool was dropped");
    }
}
