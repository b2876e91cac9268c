//! # Construcción de Respuestas HTTP
//!
//! Sólo se arma la cabecera (status line + headers). El body de un 200 es
//! el archivo, que se copia directo del disco al socket sin pasar por
//! memoria.
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/plain\r\n
//! Content-Length: 13\r\n
//! Connection: close\r\n
//! \r\n
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use static_server::http::{ResponseHead, StatusCode};
//!
//! let head = ResponseHead::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/html")
//!     .with_content_length(42);
//!
//! let bytes = head.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 200 OK\r\n"));
//! ```

use super::StatusCode;
use std::io::{self, Write};

/// Cabecera de una respuesta HTTP/1.0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusCode,

    /// Headers en orden de inserción. Un nombre repetido reemplaza al
    /// anterior.
    headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Crea una cabecera sin headers
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Respuesta sin body para códigos de error: `Content-Length: 0`
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status)
            .with_content_length(0)
            .with_header("Connection", "close")
    }

    /// Cabecera de un 200 con el tipo y tamaño del archivo
    pub fn file(content_type: &str, len: u64) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", content_type)
            .with_content_length(len)
            .with_header("Connection", "close")
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe (sin distinguir mayúsculas), se sobrescribe.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn with_content_length(self, len: u64) -> Self {
        self.with_header("Content-Length", &len.to_string())
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Serializa la cabecera completa, incluida la línea vacía final
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = format!("HTTP/1.0 {}\r\n", self.status).into_bytes();

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");
        result
    }

    /// Escribe la cabecera en el socket en una sola llamada
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_head() {
        let head = ResponseHead::file("text/plain", 4);
        let text = String::from_utf8(head.to_bytes()).unwrap();

        assert_eq!(
            text,
            "HTTP/1.0 200 OK\r\n\
             Content-Type: text/plain\r\n\
             Content-Length: 4\r\n\
             Connection: close\r\n\r\n"
        );
    }

    #[test]
    fn test_empty_head() {
        let head = ResponseHead::empty(StatusCode::NotFound);

        assert_eq!(head.status(), StatusCode::NotFound);

        let text = String::from_utf8(head.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_with_header_replaces() {
        let head = ResponseHead::new(StatusCode::Ok)
            .with_header("X-Custom", "a")
            .with_header("x-custom", "b");

        let text = String::from_utf8(head.to_bytes()).unwrap();
        assert_eq!(text, "HTTP/1.0 200 OK\r\nX-Custom: b\r\n\r\n");
    }

    #[test]
    fn test_write_to() {
        let mut out = Vec::new();
        ResponseHead::empty(StatusCode::BadRequest)
            .write_to(&mut out)
            .unwrap();

        assert!(out.starts_with(b"HTTP/1.0 400 Bad Request\r\n"));
    }
}
