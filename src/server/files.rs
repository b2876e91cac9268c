//! # Servidor de Archivos Estáticos
//! src/server/files.rs
//!
//! Colaborador que atiende una conexión completa: lee el request, resuelve
//! el path bajo el directorio servido y escribe la respuesta. Siempre
//! responde `Connection: close`; el worker cierra el socket al terminar.

use crate::error::ServeError;
use crate::http::mime;
use crate::http::request::ReadError;
use crate::http::{Method, ParseError, Request, ResponseHead, StatusCode};
use crate::workers::ConnectionHandler;
use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Sirve archivos de `root` por GET/HEAD
#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
    io_timeout: Option<Duration>,
}

impl FileServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            io_timeout: None,
        }
    }

    /// Timeout de lectura/escritura para conexiones TCP
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Traduce el path del request a un path bajo `root`
    ///
    /// Decodifica `%XX` y rechaza cualquier componente que pueda salir del
    /// directorio servido (`..`, raíz, prefijos de Windows).
    ///
    /// ```
    /// use static_server::server::FileServer;
    ///
    /// let files = FileServer::new("/srv/www");
    /// assert!(files.resolve("/docs/a%20b.txt").unwrap().ends_with("docs/a b.txt"));
    /// assert_eq!(files.resolve("/../etc/passwd"), None);
    /// ```
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let decoded = percent_decode(path)?;
        if decoded.contains('\0') {
            return None;
        }

        let mut resolved = self.root.clone();
        for component in Path::new(decoded.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        Some(resolved)
    }

    /// Atiende un request completo sobre `stream`
    ///
    /// Los 400/404/500/501 se escriben en el mejor esfuerzo y después se
    /// reportan como error para que el worker los contabilice.
    pub fn serve<S: Read + Write>(&self, stream: &mut S) -> Result<(), ServeError> {
        let request = {
            let mut reader = BufReader::new(&mut *stream);
            Request::read_from(&mut reader)
        };

        let request = match request {
            Ok(request) => request,
            // Cliente que conectó y cerró sin hablar: no hay a quién responder
            Err(ReadError::Parse(ParseError::EmptyRequest)) => {
                return Err(ParseError::EmptyRequest.into());
            }
            Err(ReadError::Parse(err)) => {
                reply_empty(stream, StatusCode::BadRequest);
                return Err(err.into());
            }
            Err(ReadError::Io(err)) => return Err(err.into()),
        };

        if let Method::Other(method) = request.method() {
            reply_empty(stream, StatusCode::NotImplemented);
            return Err(ServeError::NotImplemented(method.clone()));
        }

        let Some(path) = self.resolve(request.path()) else {
            reply_empty(stream, StatusCode::NotFound);
            return Err(ServeError::NotFound(PathBuf::from(request.path())));
        };

        let (file, len) = match open_regular(&path) {
            Ok(Some(opened)) => opened,
            Ok(None) => {
                reply_empty(stream, StatusCode::NotFound);
                return Err(ServeError::NotFound(path));
            }
            Err(err) => {
                reply_empty(stream, StatusCode::InternalServerError);
                return Err(err.into());
            }
        };

        ResponseHead::file(&mime::content_type(&path), len).write_to(stream)?;
        if *request.method() == Method::Get {
            io::copy(&mut file.take(len), stream)?;
        }
        stream.flush()?;

        debug!(
            method = request.method().as_str(),
            path = request.path(),
            version = request.version(),
            status = StatusCode::Ok.as_u16(),
            bytes = len,
            "served"
        );
        Ok(())
    }
}

impl ConnectionHandler<TcpStream> for FileServer {
    fn handle(&self, conn: &mut TcpStream) -> Result<(), ServeError> {
        if let Some(timeout) = self.io_timeout {
            conn.set_read_timeout(Some(timeout))?;
            conn.set_write_timeout(Some(timeout))?;
        }
        self.serve(conn)
    }
}

/// Abre `path` si es un archivo regular; `None` si no existe o es otra cosa
fn open_regular(path: &Path) -> io::Result<Option<(File, u64)>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        // ej: "/hello.txt/x" falla con ENOTDIR
        Err(_) if !path.is_file() => return Ok(None),
        Err(err) => return Err(err),
    };

    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Ok(None);
    }
    Ok(Some((file, metadata.len())))
}

/// Escribe una respuesta sin body en el mejor esfuerzo (4xx: debug, 5xx: warn)
fn reply_empty<W: Write>(stream: &mut W, status: StatusCode) {
    let head = ResponseHead::empty(status);
    let written = head.write_to(stream).and_then(|()| stream.flush());

    if let Err(err) = written {
        let status = head.status();
        if status.is_client_error() {
            debug!(status = status.as_u16(), %err, "could not deliver error response");
        } else {
            warn!(status = status.as_u16(), %err, "could not deliver error response");
        }
    }
}

/// Decodifica `%XX`; un `%` que no va seguido de dos dígitos hex invalida
/// el path completo
fn percent_decode(input: &str) -> Option<String> {
    let well_formed = input.split('%').skip(1).all(|rest| {
        rest.as_bytes()
            .get(..2)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return None;
    }

    urlencoding::decode(input).ok().map(|decoded| decoded.into_owned())
}
