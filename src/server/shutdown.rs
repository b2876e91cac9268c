//! # Cancelación del Dispatcher
//! src/server/shutdown.rs
//!
//! El handler de señales no toca estado global: sólo dispara un
//! [`ShutdownHandle`], que marca el token y despierta el `accept`
//! bloqueado con una conexión descartable al propio listener.

use crate::error::ServerError;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle as SignalsHandle, Signals};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cuánto esperamos la conexión de despertar antes de rendirnos
const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Token de cancelación monotónico (false -> true)
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marca el token. Retorna `true` sólo para la primera llamada.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Lo que necesita quien pide el shutdown desde afuera (señales, tests)
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    token: ShutdownToken,
    wake_addr: Option<SocketAddr>,
}

impl ShutdownHandle {
    pub fn new(token: ShutdownToken, wake_addr: Option<SocketAddr>) -> Self {
        Self { token, wake_addr }
    }

    pub fn token(&self) -> &ShutdownToken {
        &self.token
    }

    /// Pide el shutdown y despierta al dispatcher
    ///
    /// Idempotente: sólo la primera llamada abre la conexión de despertar.
    pub fn trigger(&self) {
        if !self.token.cancel() {
            return;
        }

        let Some(addr) = self.wake_addr else {
            return;
        };

        // Si el dispatcher no estaba en accept, la conexión simplemente
        // queda en el backlog y se cierra junto con el listener
        match TcpStream::connect_timeout(&addr, WAKE_TIMEOUT) {
            Ok(_) => debug!(%addr, "woke up dispatcher"),
            Err(err) => warn!(%addr, %err, "could not wake up dispatcher"),
        }
    }
}

/// Dirección a la que conectarse para llegar a un listener en `addr`
///
/// Un listener en 0.0.0.0 / [::] se alcanza por loopback.
pub fn connectable(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}

/// Thread dedicado a SIGINT / SIGTERM
pub struct SignalListener {
    signals: SignalsHandle,
    thread: JoinHandle<()>,
}

impl SignalListener {
    /// Instala los handlers; la primera señal dispara `handle`
    pub fn spawn(handle: ShutdownHandle) -> Result<Self, ServerError> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(ServerError::Signal)?;
        let signals_handle = signals.handle();

        let thread = thread::Builder::new()
            .name("signals".to_string())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(signal, "termination requested");
                    handle.trigger();
                }
            })
            .map_err(ServerError::Signal)?;

        Ok(Self {
            signals: signals_handle,
            thread,
        })
    }

    /// Desinstala los handlers y espera al thread
    pub fn close(self) {
        self.signals.close();
        if self.thread.join().is_err() {
            warn!("signal thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_token_is_monotonic() {
        let token = ShutdownToken::new();
        assert!(!token.is_cancelled());

        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_token_clones_share_state() {
        let token = ShutdownToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_trigger_wakes_blocked_accept() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let wake_addr = listener.local_addr().unwrap();
        let handle = ShutdownHandle::new(ShutdownToken::new(), Some(wake_addr));

        let waker = {
            let handle = handle.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                handle.trigger();
            })
        };

        // Sin el trigger esto bloquearía para siempre
        let accepted = listener.accept();
        assert!(accepted.is_ok());
        assert!(handle.token().is_cancelled());
        waker.join().unwrap();
    }

    #[test]
    fn test_trigger_without_address() {
        let handle = ShutdownHandle::new(ShutdownToken::new(), None);
        handle.trigger();
        handle.trigger();
        assert!(handle.token().is_cancelled());
    }

    #[test]
    fn test_connectable() {
        let any: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert_eq!(connectable(any), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());

        let any6: SocketAddr = "[::]:8080".parse().unwrap();
        assert_eq!(connectable(any6), "[::1]:8080".parse::<SocketAddr>().unwrap());

        let local: SocketAddr = "192.168.1.10:80".parse().unwrap();
        assert_eq!(connectable(local), local);
    }
}
