//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Este módulo implementa el protocolo HTTP/1.1 desde cero, directamente
//! sobre bytes crudos. Incluye:
//!
//! - Parsing incremental de requests (tolera cualquier partición del stream)
//! - Multimap de headers case-insensitive
//! - Writer de respuestas con body plano o chunked + trailers
//! - Códigos de estado
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Host: localhost:42069\r\n
//! Content-Length: 5\r\n
//! \r\n
//! hello
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! content-type: text/plain\r\n
//! content-length: 13\r\n
//! \r\n
//! Hello World!\n
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod status;

// Re-exportamos los tipos principales para facilitar su uso
// Esto permite usar `http::Request` en vez de `http::request::Request`
pub use headers::Headers;
pub use request::{Method, ParserState, Request, RequestLine};
pub use response::{ResponseWriter, WriterState};
pub use status::StatusCode;
