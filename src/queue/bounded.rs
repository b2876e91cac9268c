//! # Cola Acotada de Conexiones
//! src/queue/bounded.rs
//!
//! Ring buffer thread-safe de capacidad fija entre el dispatcher (productor)
//! y los workers (consumidores).
//!
//! - `enqueue` bloquea mientras la cola está llena (backpressure).
//! - `dequeue` bloquea mientras la cola está vacía.
//! - `shutdown` es un interruptor de una sola vía: despierta a **todos** los
//!   threads bloqueados (broadcast) y a partir de ahí rechaza nuevos
//!   elementos. Los elementos ya encolados se siguen entregando hasta vaciar
//!   la cola.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Error de `enqueue`: la cola está cerrada.
///
/// El elemento rechazado viaja dentro del error, así el llamador conserva su
/// ownership y decide cómo liberarlo (por ejemplo, cerrar la conexión).
#[derive(PartialEq, Eq, thiserror::Error)]
#[error("queue closed")]
pub struct EnqueueError<T>(pub T);

impl<T> EnqueueError<T> {
    /// Recupera el elemento que no se pudo encolar
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual para no exigir `T: Debug` (un TcpStream sí lo implementa, pero
// un handle genérico no tiene por qué)
impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnqueueError(..)")
    }
}

/// Error de `dequeue`: la cola está cerrada y vacía.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("queue closed")]
pub struct QueueClosed;

/// Estado protegido por el lock
struct State<T> {
    /// Elementos en orden FIFO (`len() <= capacity` siempre)
    items: VecDeque<T>,

    /// Monotónico: false -> true, nunca se resetea
    shutdown: bool,
}

/// Cola FIFO acotada con bloqueo en ambos extremos
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,

    /// Señal "hay espacio" (la esperan los productores)
    not_full: Condvar,

    /// Señal "hay elementos" (la esperan los consumidores)
    not_empty: Condvar,

    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola vacía con capacidad fija
    ///
    /// # Panics
    ///
    /// Si `capacity == 0`: ningún `enqueue` podría completarse jamás.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be >= 1");

        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                shutdown: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Toma el lock. Un peer que hizo panic no puede dejar el estado a medias
    /// (todas las mutaciones son de una sola instrucción bajo el lock), así
    /// que un lock envenenado se recupera.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un elemento al final
    ///
    /// Bloquea mientras la cola esté llena y abierta. Si la cola está
    /// cerrada (antes o al despertar) retorna `Err` con el elemento, sin
    /// insertarlo.
    pub fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        let mut state = self.lock();

        while state.items.len() == self.capacity && !state.shutdown {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        // "closed" tiene prioridad aunque haya espacio
        if state.shutdown {
            return Err(EnqueueError(item));
        }

        state.items.push_back(item);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Desencola el elemento más antiguo
    ///
    /// Bloquea mientras la cola esté vacía y abierta. Después del shutdown
    /// sigue entregando lo que quedó en el buffer; sólo cuando está vacía
    /// retorna `QueueClosed`.
    pub fn dequeue(&self) -> Result<T, QueueClosed> {
        let mut state = self.lock();

        while state.items.is_empty() && !state.shutdown {
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        match state.items.pop_front() {
            Some(item) => {
                drop(state);
                self.not_full.notify_one();
                Ok(item)
            }
            // Vacía => necesariamente shutdown
            None => Err(QueueClosed),
        }
    }

    /// Intenta desencolar sin bloquear
    ///
    /// Retorna `None` si la cola está vacía, esté cerrada o no.
    pub fn try_dequeue(&self) -> Option<T> {
        let item = self.lock().items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Cierra la cola y despierta a todos los threads bloqueados
    ///
    /// Idempotente. No toca los elementos ya encolados.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.shutdown = true;
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verifica si la cola está llena
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Retorna la capacidad máxima
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Obtiene estadísticas de la cola (una sola toma del lock)
    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            len: state.items.len(),
            capacity: self.capacity,
            shutdown: state.shutdown,
        }
    }
}

/// Estadísticas de la cola
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub len: usize,
    pub capacity: usize,
    pub shutdown: bool,
}
