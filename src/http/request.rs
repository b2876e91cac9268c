//! # Lectura de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Sólo nos interesa la request line; los headers se consumen y se
//! descartan (un servidor de archivos estáticos no los necesita).
//!
//! ```text
//! GET /docs/index.html?v=2 HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! \r\n
//! ```

use std::io::{BufRead, Read};

/// Límite de una línea del request (request line o header)
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Líneas vacías que se toleran antes de la request line (RFC 1945 §4.1)
pub const MAX_LEADING_BLANK_LINES: usize = 8;

/// Métodos HTTP soportados
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Headers y contenido del archivo
    Get,

    /// HEAD - Como GET pero sin body
    Head,

    /// Cualquier otro token; se responde 501
    Other(String),
}

impl Method {
    fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Other(m) => m,
        }
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// El peer cerró sin mandar nada
    #[error("empty request")]
    EmptyRequest,

    /// Formato inválido de la request line
    #[error("invalid request line: {0:?}")]
    InvalidRequestLine(String),

    /// Versión HTTP incorrecta
    #[error("invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Bytes que no son UTF-8
    #[error("request is not valid UTF-8")]
    InvalidEncoding,

    /// Línea más larga que `MAX_LINE_LEN`
    #[error("request line too long")]
    LineTooLong,
}

/// Request line parseada
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,

    /// Path sin query string (ej: "/docs/index.html")
    path: String,

    /// Query string cruda, si existía (ej: "v=2")
    query: Option<String>,

    version: String,
}

impl Request {
    /// Parsea una request line sin el terminador
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use static_server::http::{Method, Request};
    ///
    /// let request = Request::parse_line("GET /index.html?v=2 HTTP/1.0").unwrap();
    /// assert_eq!(request.method(), &Method::Get);
    /// assert_eq!(request.path(), "/index.html");
    /// assert_eq!(request.query(), Some("v=2"));
    /// ```
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD PATH VERSION
        let &[method, target, version] = parts.as_slice() else {
            return Err(ParseError::InvalidRequestLine(line.to_string()));
        };

        if !target.starts_with('/') {
            return Err(ParseError::InvalidRequestLine(line.to_string()));
        }

        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version.to_string()));
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };

        Ok(Request {
            method: Method::parse(method),
            path,
            query,
            version: version.to_string(),
        })
    }

    /// Lee un request completo desde el socket
    ///
    /// Saltea CRLF sueltos previos, parsea la request line y consume los
    /// headers hasta la línea vacía (o EOF). Los headers no se validan.
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self, ReadError> {
        let mut blank_lines = 0;
        let line = loop {
            match read_line(reader)? {
                None => return Err(ParseError::EmptyRequest.into()),
                Some(line) if line.trim().is_empty() => {
                    blank_lines += 1;
                    if blank_lines > MAX_LEADING_BLANK_LINES {
                        return Err(ParseError::InvalidRequestLine(String::new()).into());
                    }
                }
                Some(line) => break line,
            }
        };

        let request = Self::parse_line(line.trim_end())?;

        while let Some(header) = read_line(reader)? {
            if header.trim().is_empty() {
                break;
            }
        }

        Ok(request)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Falla al leer un request: I/O o formato
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Lee una línea acotada por `MAX_LINE_LEN`. `None` en EOF.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, ReadError> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(None);
    }
    if buf.len() > MAX_LINE_LEN {
        return Err(ParseError::LineTooLong.into());
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| ParseError::InvalidEncoding.into())
}
