//! # Static HTTP/1.0 Server
//! src/lib.rs
//!
//! Servidor de archivos estáticos con un único productor (el dispatcher que
//! acepta conexiones) y un pool fijo de workers consumidores, conectados por
//! una cola acotada y bloqueante.
//!
//! ## Arquitectura
//!
//! - `queue`: `BoundedQueue`, la cola compartida con backpressure
//! - `workers`: pool fijo de threads que atienden conexiones
//! - `server`: dispatcher, shutdown coordinado y servidor de archivos
//! - `http`: parsing de la request line y serialización de respuestas
//! - `metrics`: contadores atómicos y snapshot serializable
//! - `config`: configuración por CLI y variables de entorno
//! - `error`: errores de arranque y errores por conexión
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use static_server::config::Config;
//! use static_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config).expect("bind");
//! let report = server.run().expect("run");
//! println!("{}", report.stats.to_json());
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod queue;
pub mod server;
pub mod workers;
