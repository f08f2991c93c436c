//! # raw_http
//! src/lib.rs
//!
//! HTTP/1.1 implementado desde cero sobre un stream de bytes crudo, sin
//! ninguna librería HTTP de por medio.
//!
//! ## Arquitectura
//!
//! El crate está dividido en módulos especializados:
//! - `http`: parser incremental de requests, headers y writer de respuestas
//! - `error`: errores del protocolo
//! - `server`: servidor TCP (un thread por conexión) y trait de handlers
//! - `config`: configuración por CLI y variables de entorno
//! - `handlers`: rutas de demostración que usa el binario
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use raw_http::config::Config;
//! use raw_http::handlers::DemoHandler;
//! use raw_http::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config, DemoHandler::from_config(&config))
//!     .expect("Error al abrir el puerto");
//! server.run();
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod server;

pub use error::{HttpError, Result};
