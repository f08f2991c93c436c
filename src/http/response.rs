//! # Escritura de Respuestas HTTP/1.1
//! src/http/response.rs
//!
//! [`ResponseWriter`] escribe una respuesta directamente sobre cualquier
//! [`Write`] respetando el orden legal de HTTP/1.1:
//!
//! ```text
//! StatusLine → Headers → Body → Trailers → Done
//! ```
//!
//! Una llamada fuera de orden falla con [`HttpError::ProtocolState`] sin
//! escribir nada.
//!
//! ## Respuesta con Content-Length
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! connection: close\r\n
//! content-length: 13\r\n
//! content-type: text/plain\r\n
//! \r\n
//! Hello World!\n
//! ```
//!
//! ## Respuesta chunked con trailers
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! trailer: X-Content-SHA256, X-Content-Length\r\n
//! transfer-encoding: chunked\r\n
//! \r\n
//! 3\r\nabc\r\n
//! 0\r\n
//! X-Content-SHA256: ba78...\r\n
//! X-Content-Length: 3\r\n
//! \r\n
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use raw_http::http::{Headers, ResponseWriter, StatusCode};
//!
//! let mut writer = ResponseWriter::new(Vec::new());
//! writer
//!     .write_response(StatusCode::Ok, &Headers::new(), b"Hello World!\n")
//!     .unwrap();
//!
//! let bytes = writer.into_inner();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! assert!(bytes.ends_with(b"\r\n\r\nHello World!\n"));
//! ```

use super::{Headers, StatusCode};
use crate::error::{HttpError, Result};
use std::io::Write;

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &str = "\r\n";
const LAST_CHUNK: &[u8] = b"0\r\n";

/// Fase actual del writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    StatusLine,
    Headers,
    Body,
    Trailers,
    Done,
}

impl WriterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriterState::StatusLine => "StatusLine",
            WriterState::Headers => "Headers",
            WriterState::Body => "Body",
            WriterState::Trailers => "Trailers",
            WriterState::Done => "Done",
        }
    }
}

/// Writer de una única respuesta HTTP/1.1
///
/// Se crea uno por respuesta y se descarta al terminar (o tras un error).
#[derive(Debug)]
pub struct ResponseWriter<W: Write> {
    writer: W,
    state: WriterState,

    /// Nombres del header `Trailer`, en el orden declarado
    trailer_names: Vec<String>,

    /// `Content-Length` escrito en los headers (None si es chunked)
    content_length: Option<usize>,
}

impl<W: Write> ResponseWriter<W> {
    /// Crea un writer en estado [`WriterState::StatusLine`]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: WriterState::StatusLine,
            trailer_names: Vec::new(),
            content_length: None,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Recupera el destino subyacente
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn expect_state(&self, expected: WriterState) -> Result<()> {
        if self.state != expected {
            return Err(HttpError::ProtocolState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            });
        }
        Ok(())
    }

    /// Escribe `HTTP/1.1 <code> <reason>\r\n`
    pub fn write_status_line(&mut self, status: StatusCode) -> Result<()> {
        self.expect_state(WriterState::StatusLine)?;

        let line = format!("{} {}{}", HTTP_VERSION, status, CRLF);
        self.writer.write_all(line.as_bytes())?;

        tracing::trace!(status = status.as_u16(), "status line written");
        self.state = WriterState::Headers;
        Ok(())
    }

    /// Escribe los headers y la línea vacía que los termina
    ///
    /// Trabaja sobre una copia de `headers`:
    /// - fuerza `Connection: close`
    /// - agrega `Content-Type: text/plain` si falta
    /// - agrega `Content-Length: 0` si falta y la respuesta no es chunked
    ///
    /// Los nombres del header `Trailer` quedan registrados para
    /// [`write_trailers`](Self::write_trailers).
    pub fn write_headers(&mut self, headers: &Headers) -> Result<()> {
        self.expect_state(WriterState::Headers)?;

        let mut headers = headers.clone();
        headers.set("Connection", "close");

        if !headers.contains("Content-Type") {
            headers.set("Content-Type", "text/plain");
        }

        let chunked = is_chunked(&headers);
        if !chunked && !headers.contains("Content-Length") {
            headers.set("Content-Length", "0");
        }

        self.content_length = if chunked {
            None
        } else {
            headers
                .get("Content-Length")
                .and_then(|value| value.parse().ok())
        };
        self.trailer_names = headers.trailer_names();

        // Orden estable en el wire; el orden del multimap no significa nada
        let mut lines: Vec<(&str, &str)> = headers.iter().collect();
        lines.sort_unstable();

        let mut block = String::new();
        for (key, value) in lines {
            block.push_str(key);
            block.push_str(": ");
            block.push_str(value);
            block.push_str(CRLF);
        }
        block.push_str(CRLF);

        self.writer.write_all(block.as_bytes())?;

        tracing::trace!(
            chunked,
            trailers = self.trailer_names.len(),
            "headers written"
        );
        self.state = WriterState::Body;
        Ok(())
    }

    /// Escribe el body completo de una respuesta no chunked
    ///
    /// Si los headers declararon `Content-Length`, el body debe medir
    /// exactamente eso o falla con [`HttpError::BodyLengthMismatch`].
    pub fn write_body(&mut self, body: &[u8]) -> Result<usize> {
        self.expect_state(WriterState::Body)?;

        if let Some(declared) = self.content_length {
            if declared != body.len() {
                return Err(HttpError::BodyLengthMismatch {
                    declared,
                    received: body.len(),
                });
            }
        }

        self.writer.write_all(body)?;
        self.state = WriterState::Trailers;
        Ok(body.len())
    }

    /// Escribe un chunk: `<hex(len)>\r\n<chunk>\r\n`
    ///
    /// Se puede llamar cualquier cantidad de veces mientras el writer esté en
    /// [`WriterState::Body`]. Un chunk vacío no escribe nada (el chunk de
    /// largo 0 es el terminador, ver
    /// [`write_chunked_body_done`](Self::write_chunked_body_done)).
    ///
    /// Retorna la cantidad de bytes escritos, incluyendo el framing.
    pub fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize> {
        self.expect_state(WriterState::Body)?;

        if chunk.is_empty() {
            return Ok(0);
        }

        let size_line = format!("{:x}{}", chunk.len(), CRLF);
        let mut frame = Vec::with_capacity(size_line.len() + chunk.len() + CRLF.len());
        frame.extend_from_slice(size_line.as_bytes());
        frame.extend_from_slice(chunk);
        frame.extend_from_slice(CRLF.as_bytes());

        self.writer.write_all(&frame)?;
        Ok(frame.len())
    }

    /// Escribe el chunk terminal `0\r\n`
    pub fn write_chunked_body_done(&mut self) -> Result<usize> {
        self.expect_state(WriterState::Body)?;

        self.writer.write_all(LAST_CHUNK)?;
        self.state = WriterState::Trailers;
        Ok(LAST_CHUNK.len())
    }

    /// Escribe los trailers declarados y la línea vacía final
    ///
    /// Cada nombre declarado en `Trailer` se busca en `trailers` y se emite en
    /// el orden de la declaración, con la forma en que fue declarado. Si falta
    /// alguno no se escribe nada.
    ///
    /// # Errores
    ///
    /// - [`HttpError::TrailersNotDeclared`] si los headers no tenían `Trailer`
    /// - [`HttpError::TrailerMissing`] si falta el valor de un nombre declarado
    pub fn write_trailers(&mut self, trailers: &Headers) -> Result<()> {
        self.expect_state(WriterState::Trailers)?;

        if self.trailer_names.is_empty() {
            return Err(HttpError::TrailersNotDeclared);
        }

        let mut block = String::new();
        for name in &self.trailer_names {
            let value = trailers
                .get(name)
                .ok_or_else(|| HttpError::TrailerMissing(name.clone()))?;

            block.push_str(name);
            block.push_str(": ");
            block.push_str(value);
            block.push_str(CRLF);
        }
        block.push_str(CRLF);

        self.writer.write_all(block.as_bytes())?;
        self.state = WriterState::Done;
        Ok(())
    }

    /// Status line, headers y body en una sola llamada
    ///
    /// Si `headers` no trae `Content-Length` se usa el largo de `body`.
    pub fn write_response(
        &mut self,
        status: StatusCode,
        headers: &Headers,
        body: &[u8],
    ) -> Result<()> {
        let mut headers = headers.clone();
        if !is_chunked(&headers) && !headers.contains("Content-Length") {
            headers.set("Content-Length", &body.len().to_string());
        }

        self.write_status_line(status)?;
        self.write_headers(&headers)?;
        self.write_body(body)?;
        Ok(())
    }
}

fn is_chunked(headers: &Headers) -> bool {
    headers.get("Transfer-Encoding").is_some_and(|encoding| {
        encoding
            .split(',')
            .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
    })
}
