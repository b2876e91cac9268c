//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Lado productor del sistema y todo lo que lo rodea:
//! - `listener`: fuente de conexiones (`TcpListener` o un doble de prueba)
//! - `dispatcher`: loop de accept -> enqueue y protocolo de shutdown
//! - `shutdown`: token de cancelación, handle y thread de señales
//! - `files`: colaborador que atiende cada conexión (GET/HEAD de archivos)
//! - `tcp`: ensamblado de todo lo anterior a partir de la configuración

pub mod dispatcher;
pub mod files;
pub mod listener;
pub mod shutdown;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use dispatcher::{DispatchReport, Dispatcher};
pub use files::FileServer;
pub use listener::Listener;
pub use shutdown::{ShutdownHandle, ShutdownToken, SignalListener};
pub use tcp::Server;
