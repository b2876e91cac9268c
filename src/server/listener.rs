//! # Endpoint de Escucha
//! src/server/listener.rs
//!
//! El dispatcher sólo necesita `accept`. El trait existe para poder
//! probarlo sin sockets reales.

use super::shutdown::connectable;
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};

/// Fuente de conexiones entrantes
pub trait Listener: Send {
    /// Handle de una conexión aceptada; pasa por la cola a un worker
    type Conn: Send + 'static;

    /// Bloquea hasta la siguiente conexión
    fn accept(&self) -> io::Result<Self::Conn>;

    /// Dirección a la que conectarse para despertar un `accept` bloqueado
    fn wake_addr(&self) -> Option<SocketAddr> {
        None
    }
}

impl Listener for TcpListener {
    type Conn = TcpStream;

    fn accept(&self) -> io::Result<TcpStream> {
        TcpListener::accept(self).map(|(stream, _)| stream)
    }

    fn wake_addr(&self) -> Option<SocketAddr> {
        self.local_addr().ok().map(connectable)
    }
}

/// Errores de `accept` que se reintentan; el resto es fatal
pub fn is_transient(err: &io::Error) -> bool {
    err.kind() == ErrorKind::Interrupted
}
