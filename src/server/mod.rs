//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Parsea el request de forma incremental
//! 4. Delega la respuesta a un [`Handler`] y cierra la conexión

pub mod handler;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use handler::{ConnWriter, Handler, HandlerError};
pub use tcp::{RunningServer, Server};
