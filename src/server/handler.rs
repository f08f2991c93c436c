//! # Handlers
//! src/server/handler.rs
//!
//! Un [`Handler`] recibe el request ya parseado y escribe la respuesta con el
//! [`ResponseWriter`] de la conexión. Si falla antes de empezar la respuesta,
//! el servidor serializa el [`HandlerError`] como texto plano.

use crate::error::HttpError;
use crate::http::{Headers, Request, ResponseWriter, StatusCode};
use std::io::Write;
use thiserror::Error;

/// Writer que recibe cada handler (escribe directo al socket)
pub type ConnWriter<'a> = ResponseWriter<&'a mut dyn Write>;

/// Error de aplicación con el status que se le debe responder al cliente
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Escribe el error como respuesta completa de texto plano
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::{ResponseWriter, StatusCode};
    /// use raw_http::server::HandlerError;
    ///
    /// let mut writer = ResponseWriter::new(Vec::new());
    /// HandlerError::new(StatusCode::NotFound, "nope")
    ///     .write_to(&mut writer)
    ///     .unwrap();
    ///
    /// let bytes = writer.into_inner();
    /// assert!(bytes.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
    /// assert!(bytes.ends_with(b"\r\n\r\nnope"));
    /// ```
    pub fn write_to<W: Write>(&self, writer: &mut ResponseWriter<W>) -> crate::error::Result<()> {
        writer.write_response(self.status, &Headers::new(), self.message.as_bytes())
    }
}

/// Los errores del writer dentro de un handler se convierten en 500
impl From<HttpError> for HandlerError {
    fn from(err: HttpError) -> Self {
        HandlerError::new(StatusCode::InternalServerError, err.to_string())
    }
}

/// Capacidad de atender un request
///
/// Se comparte entre todos los threads de conexión.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, w: &mut ConnWriter<'_>, req: &Request) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&mut ConnWriter<'_>, &Request) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn handle(&self, w: &mut ConnWriter<'_>, req: &Request) -> Result<(), HandlerError> {
        self(w, req)
    }
}
