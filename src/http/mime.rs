//! # Tipos MIME
//! src/http/mime.rs
//!
//! `Content-Type` a partir de la extensión del archivo.

use std::path::Path;

/// Tipo usado cuando la extensión no se reconoce
pub const FALLBACK: &str = "application/octet-stream";

/// Resuelve el `Content-Type` de un archivo por su extensión
///
/// # Ejemplo
/// ```
/// use static_server::http::mime::content_type;
///
/// assert_eq!(content_type("docs/index.html".as_ref()), "text/html");
/// assert_eq!(content_type("blob".as_ref()), "application/octet-stream");
/// ```
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        let cases = [
            ("a.txt", "text/plain"),
            ("a.html", "text/html"),
            ("a.jpg", "image/jpeg"),
            ("a.png", "image/png"),
            ("a.pdf", "application/pdf"),
            ("a.mp3", "audio/mpeg"),
        ];

        for (file, expected) in cases {
            assert_eq!(content_type(Path::new(file)), expected, "for {}", file);
        }
    }

    #[test]
    fn test_uppercase_extension() {
        assert_eq!(content_type(Path::new("PHOTO.PNG")), "image/png");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type(Path::new("data.unknownext")), FALLBACK);
        assert_eq!(content_type(Path::new("Makefile")), FALLBACK);
    }
}
