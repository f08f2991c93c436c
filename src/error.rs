//! # Errores del protocolo
//! src/error.rs
//!
//! Taxonomía única de errores para el parser de requests, el multimap de
//! headers y el writer de respuestas. Todos los errores de parsing son
//! terminales para el request actual.

use std::{fmt, io};
use thiserror::Error;

/// Atajo para resultados del crate
pub type Result<T> = std::result::Result<T, HttpError>;

/// Motivo por el que se rechaza un método HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodViolation {
    /// El método no está completamente en mayúsculas (ej: `get`)
    Case,

    /// El método está bien escrito pero no lo soportamos (ej: `PIZZA`)
    Unsupported,
}

/// Motivo por el que se rechaza la versión HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionViolation {
    /// No tiene la forma `HTTP/<version>`
    MalformedFormat,

    /// Tiene la forma correcta pero no es `1.1`
    Unsupported,
}

impl fmt::Display for MethodViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodViolation::Case => write!(f, "method must be upper-case"),
            MethodViolation::Unsupported => write!(f, "method not supported"),
        }
    }
}

impl fmt::Display for VersionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionViolation::MalformedFormat => write!(f, "expected HTTP/<major>.<minor>"),
            VersionViolation::Unsupported => write!(f, "only HTTP/1.1 is supported"),
        }
    }
}

/// Errores que pueden ocurrir al parsear o escribir mensajes HTTP/1.1
#[derive(Debug, Error)]
pub enum HttpError {
    /// La request line no tiene exactamente 3 partes separadas por espacio
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("invalid method {method:?}: {violation}")]
    InvalidMethod {
        method: String,
        violation: MethodViolation,
    },

    #[error("invalid http version {version:?}: {violation}")]
    InvalidHttpVersion {
        version: String,
        violation: VersionViolation,
    },

    /// Línea de header sin separador `:` o con bytes que no son UTF-8
    #[error("malformed header line: {0:?}")]
    MalformedHeaderLine(String),

    #[error("invalid header key: {0:?}")]
    InvalidHeaderKey(String),

    /// Llegaron bytes de body sin un `Content-Length` que los respalde
    #[error("body bytes received without a content-length header")]
    MissingContentLength,

    #[error("invalid content-length value: {0:?}")]
    InvalidContentLength(String),

    /// El `Content-Length` declarado es un contrato estricto
    #[error("body length mismatch: declared {declared} bytes, got {received}")]
    BodyLengthMismatch { declared: usize, received: usize },

    /// Operación invocada fuera de su estado (parser o writer)
    #[error("protocol state error: expected state {expected}, current state {actual}")]
    ProtocolState {
        expected: &'static str,
        actual: &'static str,
    },

    /// El stream terminó antes de completar el request
    #[error("incomplete request: stream ended in state {state} after {received} bytes")]
    IncompleteRequest {
        state: &'static str,
        received: usize,
    },

    /// Un trailer declarado en el header `Trailer` no tiene valor
    #[error("declared trailer {0:?} has no value")]
    TrailerMissing(String),

    #[error("no trailer names were declared in the response headers")]
    TrailersNotDeclared,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl HttpError {
    /// Indica si el error vino del transporte y no del contenido del mensaje
    pub fn is_io(&self) -> bool {
        matches!(self, HttpError::Io(_))
    }
}
