//! # Módulo HTTP
//!
//! Lo mínimo de HTTP/1.0 (RFC 1945) para servir archivos:
//!
//! - Lectura de la request line (los headers se descartan)
//! - Serialización de la cabecera de respuesta
//! - Status codes
//! - `Content-Type` por extensión
//!
//! Sin keep-alive, sin chunked transfer, sin pipelining: una conexión, un
//! request, una respuesta.

pub mod mime;
pub mod request;
pub mod response;
pub mod status;

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Method, ParseError, Request};
pub use response::ResponseHead;
pub use status::StatusCode;
