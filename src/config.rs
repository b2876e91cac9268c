//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI con fallback a variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./static_server ./public 8080 --workers 8 --queue-capacity 32
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! WORKERS=8 QUEUE_CAPACITY=32 HTTP_HOST=0.0.0.0 ./static_server ./public 8080
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Errores de validación de la configuración
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("workers must be >= 1")]
    NoWorkers,

    #[error("queue capacity must be >= 1")]
    ZeroQueueCapacity,

    #[error("serve directory {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// Configuración del servidor de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "static_server")]
#[command(about = "Servidor HTTP/1.0 de archivos estáticos con pool fijo de workers")]
#[command(version)]
pub struct Config {
    /// Directorio cuyos archivos se sirven
    #[arg(value_name = "SERVE_DIR")]
    pub serve_dir: PathBuf,

    /// Puerto en el que escucha el servidor (0 = efímero)
    #[arg(value_name = "PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Workers y cola ===
    /// Número de workers (fijo durante toda la vida del proceso)
    #[arg(long, default_value = "5", env = "WORKERS")]
    pub workers: usize,

    /// Conexiones aceptadas que pueden esperar en la cola
    #[arg(long = "queue-capacity", default_value = "5", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === Timeouts ===
    /// Timeout de lectura/escritura por conexión en milisegundos (0 = sin timeout)
    #[arg(long = "io-timeout-ms", default_value = "0", env = "IO_TIMEOUT_MS")]
    pub io_timeout_ms: u64,

    // === Logging ===
    /// Filtro de logs (ej: "debug", "static_server=trace"); RUST_LOG tiene prioridad
    #[arg(long = "log-level", env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use static_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout por conexión, si está habilitado
    pub fn io_timeout(&self) -> Option<Duration> {
        (self.io_timeout_ms > 0).then(|| Duration::from_millis(self.io_timeout_ms))
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if !self.serve_dir.is_dir() {
            return Err(ConfigError::NotADirectory(self.serve_dir.clone()));
        }
        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("=================================");
        println!("  Static HTTP/1.0 Server");
        println!("=================================");
        println!("   Address:      {}", self.address());
        println!("   Serve dir:    {}", self.serve_dir.display());
        println!("   Workers:      {}", self.workers);
        println!("   Queue cap:    {}", self.queue_capacity);
        match self.io_timeout() {
            Some(timeout) => println!("   I/O timeout:  {} ms", timeout.as_millis()),
            None => println!("   I/O timeout:  disabled"),
        }
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto (sirve el directorio actual)
    fn default() -> Self {
        Self {
            serve_dir: PathBuf::from("."),
            port: 8080,
            host: "127.0.0.1".to_string(),
            workers: 5,
            queue_capacity: 5,
            io_timeout_ms: 0,
            log_level: None,
        }
    }
}
