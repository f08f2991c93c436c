//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor HTTP con soporte para
//! argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./raw_http --port 8080 --read-timeout-ms 5000 --stream-chunk-size 64
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 ./raw_http
//! ```

use clap::Parser;
use std::time::Duration;

/// Configuración del servidor HTTP/1.1
#[derive(Debug, Clone, Parser)]
#[command(name = "raw_http")]
#[command(about = "Servidor HTTP/1.1 sobre TCP crudo, con respuestas chunked y trailers")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "42069", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Timeout de lectura del socket en milisegundos (0 = sin timeout)
    #[arg(long = "read-timeout-ms", default_value = "0", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Tamaño de cada chunk en las respuestas de /stream/<n>
    #[arg(long = "stream-chunk-size", default_value = "32", env = "STREAM_CHUNK_SIZE")]
    pub stream_chunk_size: usize,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use raw_http::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:42069");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout de lectura para cada conexión; `None` si está deshabilitado
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host must not be empty".to_string());
        }

        if self.stream_chunk_size == 0 {
            return Err("Stream chunk size must be >= 1".to_string());
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            read_timeout_ms = self.read_timeout_ms,
            stream_chunk_size = self.stream_chunk_size,
            "configuration loaded"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 42069,
            host: "127.0.0.1".to_string(),
            read_timeout_ms: 0,
            stream_chunk_size: 32,
        }
    }
}
