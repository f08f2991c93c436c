//! # Parsing incremental de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Este módulo implementa un parser HTTP/1.1 desde cero que consume bytes de
//! cualquier [`Read`] sin necesitar el request completo en memoria.
//!
//! ## Formato de un Request HTTP/1.1
//!
//! ```text
//! POST /coffee HTTP/1.1\r\n
//! Host: localhost:42069\r\n
//! Content-Length: 13\r\n
//! \r\n
//! hello world!\n
//! ```
//!
//! ## Máquina de estados
//!
//! ```text
//! Initialized → ParsingHeaders → ParsingBody → Completed
//! ```
//!
//! Cada paso consume lo que puede de los bytes disponibles. Un paso que
//! consume 0 bytes sin cambiar de estado significa "faltan bytes": el loop de
//! lectura trae más del stream y vuelve a intentar con lo no consumido.

use super::headers::{find_crlf, Headers};
use crate::error::{HttpError, MethodViolation, Result, VersionViolation};
use std::io::{self, Read};

const CRLF_LEN: usize = 2;

/// Capacidad inicial del buffer de parsing (se duplica cuando se llena)
const INITIAL_BUFFER_SIZE: usize = 8;

/// Largo máximo de la request line o de una línea de header
pub const MAX_LINE_LEN: usize = 8 * 1024;

const PROTOCOL_NAME: &str = "HTTP";
const SUPPORTED_VERSION: &str = "1.1";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    GET,
    HEAD,
    POST,
    PUT,
    PATCH,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
}

impl Method {
    /// Todos los métodos que acepta el parser
    pub const ALL: [Method; 9] = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::CONNECT,
        Method::OPTIONS,
        Method::TRACE,
    ];

    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// - [`MethodViolation::Case`] si no está todo en mayúsculas (`get`)
    /// - [`MethodViolation::Unsupported`] si no está en [`Method::ALL`] (`PIZZA`)
    pub fn parse(s: &str) -> Result<Self> {
        if !s.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(HttpError::InvalidMethod {
                method: s.to_string(),
                violation: MethodViolation::Case,
            });
        }

        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| HttpError::InvalidMethod {
                method: s.to_string(),
                violation: MethodViolation::Unsupported,
            })
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primera línea del request: `METHOD SP TARGET SP HTTP/1.1`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,

    /// Target tal cual llegó (no se interpreta path ni query)
    pub target: String,

    /// Versión sin el prefijo `HTTP/` (siempre `"1.1"`)
    pub http_version: String,
}

/// Estado del parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Initialized,
    ParsingHeaders,
    ParsingBody,
    Completed,
}

impl ParserState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserState::Initialized => "Initialized",
            ParserState::ParsingHeaders => "ParsingHeaders",
            ParserState::ParsingBody => "ParsingBody",
            ParserState::Completed => "Completed",
        }
    }
}

/// Representa un request HTTP/1.1 parseado
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    request_line: RequestLine,
    headers: Headers,
    body: Vec<u8>,
    state: ParserState,

    /// `Content-Length` memoizado: `None` mientras no se haya leído el header
    declared_length: Option<Option<usize>>,
}

impl Request {
    fn new() -> Self {
        Self::default()
    }

    /// Lee y parsea un request completo desde un stream de bytes
    ///
    /// Lee hasta que el request queda en [`ParserState::Completed`]; nunca
    /// lee más allá de ese punto.
    ///
    /// # Errores
    ///
    /// - Cualquier error de parsing (request line, headers, body)
    /// - [`HttpError::IncompleteRequest`] si el stream termina antes
    /// - [`HttpError::Io`] si falla una lectura
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::Request;
    ///
    /// let raw: &[u8] = b"GET /coffee HTTP/1.1\r\nHost: localhost:42069\r\n\r\n";
    /// let request = Request::from_reader(raw).unwrap();
    ///
    /// assert_eq!(request.target(), "/coffee");
    /// assert_eq!(request.header("host"), Some("localhost:42069"));
    /// ```
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut request = Request::new();
        let mut buffer = ParseBuffer::with_capacity(INITIAL_BUFFER_SIZE);
        let mut received = 0;

        while !request.is_complete() {
            let read = match buffer.fill_from(&mut reader) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if read == 0 {
                return Err(HttpError::IncompleteRequest {
                    state: request.state.as_str(),
                    received,
                });
            }
            received += read;

            // Sin un CRLF nuevo la línea pendiente sigue incompleta
            if request.awaits_line() && !buffer.has_new_line_end(read) {
                request.check_line_len(buffer.filled().len())?;
                continue;
            }

            let consumed = request.feed(buffer.filled())?;
            buffer.consume(consumed);
            request.check_line_len(buffer.filled().len())?;

            tracing::trace!(
                read,
                consumed,
                state = request.state.as_str(),
                "request bytes parsed"
            );
        }

        Ok(request)
    }

    /// Parsea un request que ya está completo en memoria
    ///
    /// A diferencia de [`from_reader`](Self::from_reader), acá se conoce el
    /// input entero: cualquier byte que sobre después del request es un error.
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::{Method, Request};
    ///
    /// let request = Request::parse(b"DELETE /coffee/1 HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(request.method(), Method::DELETE);
    /// assert!(request.body().is_empty());
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        let mut request = Request::new();
        let consumed = request.feed(buffer)?;

        if !request.is_complete() {
            return Err(HttpError::IncompleteRequest {
                state: request.state.as_str(),
                received: buffer.len(),
            });
        }

        let excess = buffer.len() - consumed;
        if excess > 0 {
            return Err(HttpError::BodyLengthMismatch {
                declared: request.content_length().unwrap_or(0),
                received: request.body.len() + excess,
            });
        }

        Ok(request)
    }

    /// En estos estados solo se avanza al completar una línea con CRLF
    fn awaits_line(&self) -> bool {
        matches!(
            self.state,
            ParserState::Initialized | ParserState::ParsingHeaders
        )
    }

    /// Limita el largo de la línea actual, haya llegado su CRLF o no
    fn check_line_len(&self, len: usize) -> Result<()> {
        if len <= MAX_LINE_LEN {
            return Ok(());
        }

        match self.state {
            ParserState::Initialized => Err(HttpError::MalformedRequestLine(format!(
                "request line exceeds {} bytes",
                MAX_LINE_LEN
            ))),
            ParserState::ParsingHeaders => Err(HttpError::MalformedHeaderLine(format!(
                "header line exceeds {} bytes",
                MAX_LINE_LEN
            ))),
            _ => Ok(()),
        }
    }

    /// Consume todo lo posible de `data` y retorna cuántos bytes usó
    fn feed(&mut self, data: &[u8]) -> Result<usize> {
        if self.is_complete() {
            return Err(HttpError::ProtocolState {
                expected: "Initialized, ParsingHeaders or ParsingBody",
                actual: self.state.as_str(),
            });
        }

        let mut total = 0;
        while !self.is_complete() {
            let before = self.state;
            let n = self.feed_single(&data[total..])?;
            total += n;

            if n == 0 && self.state == before {
                break;
            }
        }

        Ok(total)
    }

    fn feed_single(&mut self, data: &[u8]) -> Result<usize> {
        match self.state {
            ParserState::Initialized => {
                let n = self.parse_request_line(data)?;
                if n > 0 {
                    self.state = ParserState::ParsingHeaders;
                }
                Ok(n)
            }
            ParserState::ParsingHeaders => {
                let (n, done) = self.headers.parse(data)?;
                if n > CRLF_LEN {
                    self.check_line_len(n - CRLF_LEN)?;
                }
                if done {
                    self.state = ParserState::ParsingBody;
                }
                Ok(n)
            }
            ParserState::ParsingBody => self.parse_body(data),
            ParserState::Completed => Err(HttpError::ProtocolState {
                expected: "ParsingBody",
                actual: self.state.as_str(),
            }),
        }
    }

    /// Parsea la request line. Retorna 0 si todavía no llegó el CRLF.
    fn parse_request_line(&mut self, data: &[u8]) -> Result<usize> {
        let Some(idx) = find_crlf(data) else {
            return Ok(0);
        };
        self.check_line_len(idx)?;

        let raw_line = &data[..idx];
        let line = std::str::from_utf8(raw_line).map_err(|_| {
            HttpError::MalformedRequestLine(String::from_utf8_lossy(raw_line).into_owned())
        })?;

        let parts: Vec<&str> = line.split(' ').collect();
        let [method, target, version] = parts.as_slice() else {
            return Err(HttpError::MalformedRequestLine(line.to_string()));
        };

        let method = Method::parse(method)?;
        let http_version = parse_http_version(version)?;

        self.request_line = RequestLine {
            method,
            target: target.to_string(),
            http_version,
        };

        Ok(idx + CRLF_LEN)
    }

    fn parse_body(&mut self, data: &[u8]) -> Result<usize> {
        let declared = self.declared_content_length()?;

        // Se tolera un único '\n' suelto después de los headers cuando no
        // hay body declarado (clientes que terminan con "\r\n\r\n\n")
        if matches!(declared, None | Some(0)) && data == b"\n" {
            self.state = ParserState::Completed;
            return Ok(1);
        }

        let Some(declared) = declared else {
            if data.is_empty() {
                self.state = ParserState::Completed;
                return Ok(0);
            }
            return Err(HttpError::MissingContentLength);
        };

        self.body.extend_from_slice(data);

        if self.body.len() > declared {
            return Err(HttpError::BodyLengthMismatch {
                declared,
                received: self.body.len(),
            });
        }

        if self.body.len() == declared {
            self.state = ParserState::Completed;
        }

        Ok(data.len())
    }

    /// Lee `Content-Length` una sola vez; las llamadas siguientes usan el memo
    fn declared_content_length(&mut self) -> Result<Option<usize>> {
        if let Some(declared) = self.declared_length {
            return Ok(declared);
        }

        let declared = match self.headers.get("Content-Length") {
            None => None,
            Some(raw) => Some(parse_content_length(raw)?),
        };

        self.declared_length = Some(declared);
        Ok(declared)
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.request_line.method
    }

    /// Obtiene el target crudo (ej: "/httpbin/stream/10?x=1")
    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    /// Obtiene la versión HTTP (siempre "1.1")
    pub fn http_version(&self) -> &str {
        &self.request_line.http_version
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Obtiene un header específico (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Obtiene el body del request como String
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// `Content-Length` declarado, si el parser llegó a leerlo
    pub fn content_length(&self) -> Option<usize> {
        self.declared_length.flatten()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParserState::Completed
    }
}

/// Valida `HTTP/1.1` y retorna la parte de la versión (`"1.1"`)
fn parse_http_version(token: &str) -> Result<String> {
    let malformed = || HttpError::InvalidHttpVersion {
        version: token.to_string(),
        violation: VersionViolation::MalformedFormat,
    };

    let parts: Vec<&str> = token.split('/').collect();
    let [name, version] = parts.as_slice() else {
        return Err(malformed());
    };

    if *name != PROTOCOL_NAME {
        return Err(malformed());
    }

    if *version != SUPPORTED_VERSION {
        return Err(HttpError::InvalidHttpVersion {
            version: token.to_string(),
            violation: VersionViolation::Unsupported,
        });
    }

    Ok(version.to_string())
}

/// Solo dígitos: rechaza signos (`-1`, `+1`) y valores vacíos
fn parse_content_length(raw: &str) -> Result<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HttpError::InvalidContentLength(raw.to_string()));
    }

    raw.parse::<usize>()
        .map_err(|_| HttpError::InvalidContentLength(raw.to_string()))
}

/// Buffer de lectura que crece al doble cuando se llena y compacta al consumir
#[derive(Debug)]
struct ParseBuffer {
    bytes: Vec<u8>,
    filled: usize,
}

impl ParseBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity.max(1)],
            filled: 0,
        }
    }

    /// Una sola lectura del reader al final de los bytes ya cargados
    fn fill_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        if self.filled == self.bytes.len() {
            let doubled = self.bytes.len() * 2;
            self.bytes.resize(doubled, 0);
        }

        let n = reader.read(&mut self.bytes[self.filled..])?;
        self.filled += n;
        Ok(n)
    }

    fn filled(&self) -> &[u8] {
        &self.bytes[..self.filled]
    }

    /// Busca un CRLF solo entre los últimos `read` bytes (más el anterior,
    /// por si el `\r` llegó en la lectura previa)
    fn has_new_line_end(&self, read: usize) -> bool {
        let start = self.filled.saturating_sub(read + 1);
        find_crlf(&self.bytes[start..self.filled]).is_some()
    }

    /// Descarta los primeros `n` bytes y mueve el resto al inicio
    fn consume(&mut self, n: usize) {
        self.bytes.copy_within(n..self.filled, 0);
        self.filled -= n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader que entrega como máximo `per_read` bytes por llamada, para
    /// simular cómo llegan los datos por la red
    struct ChunkReader {
        data: Vec<u8>,
        per_read: usize,
        pos: usize,
    }

    impl ChunkReader {
        fn new(data: impl AsRef<[u8]>, per_read: usize) -> Self {
            Self {
                data: data.as_ref().to_vec(),
                per_read,
                pos: 0,
            }
        }
    }

    impl Read for ChunkReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() {
                return Ok(0);
            }

            let end = (self.pos + self.per_read).min(self.data.len());
            let n = (end - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    const CURL_GET: &str = "GET / HTTP/1.1\r\n\
                            Host: localhost:42069\r\n\
                            User-Agent: curl/7.81.0\r\n\
                            Accept: */*\r\n\
                            \r\n";

    fn parse_chunked(data: &str, per_read: usize) -> Result<Request> {
        Request::from_reader(ChunkReader::new(data, per_read))
    }

    #[test]
    fn test_parse_simple_get_byte_by_byte() {
        let request = parse_chunked(CURL_GET, 1).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.target(), "/");
        assert_eq!(request.http_version(), "1.1");
        assert_eq!(request.header("host"), Some("localhost:42069"));
        assert_eq!(request.header("User-Agent"), Some("curl/7.81.0"));
        assert_eq!(request.header("ACCEPT"), Some("*/*"));
        assert!(request.body().is_empty());
        assert!(request.is_complete());
    }

    #[test]
    fn test_parse_with_target_in_one_read() {
        let data = "GET /coffee HTTP/1.1\r\nHost: localhost:42069\r\n\r\n";
        let request = parse_chunked(data, data.len()).unwrap();

        assert_eq!(request.target(), "/coffee");
    }

    #[test]
    fn test_chunk_boundaries_do_not_change_result() {
        let data = "POST /submit?id=7 HTTP/1.1\r\n\
                    Host: localhost:42069\r\n\
                    X-Tag: a\r\n\
                    x-tag: b\r\n\
                    Content-Length: 13\r\n\
                    \r\n\
                    hello world!\n";

        let whole = Request::parse(data.as_bytes()).unwrap();
        assert_eq!(whole.body(), b"hello world!\n");
        assert_eq!(whole.header("x-tag"), Some("a, b"));

        for per_read in 1..=data.len() {
            let chunked = parse_chunked(data, per_read).unwrap();
            assert_eq!(chunked, whole, "differs with {} bytes per read", per_read);
        }
    }

    #[test]
    fn test_many_headers_in_same_chunk() {
        let data = "GET / HTTP/1.1\r\n\
                    Host: localhost:42069\r\n\
                    team: one\r\n\
                    User-Agent: curl/7.81.0\r\n\
                    team: two\r\n\
                    team: three\r\n\
                    \r\n";

        let request = parse_chunked(data, 1080).unwrap();

        assert_eq!(request.header("host"), Some("localhost:42069"));
        assert_eq!(request.header("team"), Some("one, two, three"));
    }

    #[test]
    fn test_trailing_line_feed_without_body() {
        let data = "GET /httpbin/stream/100 HTTP/1.1\r\nHost: localhost:42069\r\nConnection: close\r\n\r\n\n";
        let request = parse_chunked(data, data.len()).unwrap();

        assert_eq!(request.target(), "/httpbin/stream/100");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_trailing_line_feed_with_zero_content_length() {
        let data = "POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n\n";
        let request = Request::parse(data.as_bytes()).unwrap();

        assert_eq!(request.content_length(), Some(0));
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_missing_method() {
        let result = parse_chunked("/coffee HTTP/1.1\r\nHost: localhost\r\n\r\n", 10);
        assert!(matches!(result, Err(HttpError::MalformedRequestLine(_))));
    }

    #[test]
    fn test_missing_target() {
        let result = parse_chunked("GET HTTP/1.1\r\nHost: localhost\r\n\r\n", 8);
        assert!(matches!(result, Err(HttpError::MalformedRequestLine(_))));
    }

    #[test]
    fn test_missing_version() {
        let result = parse_chunked("GET /coffee\r\nHost: localhost\r\n\r\n", 8);
        assert!(matches!(result, Err(HttpError::MalformedRequestLine(_))));
    }

    #[test]
    fn test_lowercase_method() {
        let result = parse_chunked("get / HTTP/1.1\r\nHost: localhost\r\n\r\n", 8);

        match result {
            Err(HttpError::InvalidMethod { method, violation }) => {
                assert_eq!(method, "get");
                assert_eq!(violation, MethodViolation::Case);
            }
            other => panic!("expected InvalidMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_method() {
        let result = parse_chunked("PIZZA / HTTP/1.1\r\nHost: localhost\r\n\r\n", 8);

        match result {
            Err(HttpError::InvalidMethod { method, violation }) => {
                assert_eq!(method, "PIZZA");
                assert_eq!(violation, MethodViolation::Unsupported);
            }
            other => panic!("expected InvalidMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_version() {
        let result = parse_chunked("GET / HTTP/2.0\r\nHost: localhost\r\n\r\n", 8);

        assert!(matches!(
            result,
            Err(HttpError::InvalidHttpVersion {
                violation: VersionViolation::Unsupported,
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_version() {
        for line in ["GET / HTTP2.0\r\n\r\n", "GET / HTTP/1/1\r\n\r\n", "GET / FTP/1.1\r\n\r\n"] {
            let result = parse_chunked(line, 4);
            assert!(
                matches!(
                    result,
                    Err(HttpError::InvalidHttpVersion {
                        violation: VersionViolation::MalformedFormat,
                        ..
                    })
                ),
                "{:?} should be malformed",
                line
            );
        }
    }

    #[test]
    fn test_invalid_header_fails_request() {
        let result = parse_chunked("GET / HTTP/1.1\r\nHost : localhost\r\n\r\n", 3);
        assert!(matches!(result, Err(HttpError::InvalidHeaderKey(_))));
    }

    #[test]
    fn test_body_shorter_than_declared_is_incomplete() {
        let data = "POST / HTTP/1.1\r\nContent-Length: 20\r\n\r\npartial content";

        for per_read in [1, 5, data.len()] {
            match parse_chunked(data, per_read) {
                Err(HttpError::IncompleteRequest { state, received }) => {
                    assert_eq!(state, "ParsingBody");
                    assert_eq!(received, data.len());
                }
                other => panic!("expected IncompleteRequest, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_body_longer_than_declared() {
        let data = "POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello world";
        let result = parse_chunked(data, data.len());

        match result {
            Err(HttpError::BodyLengthMismatch { declared, received }) => {
                assert_eq!(declared, 5);
                assert_eq!(received, 11);
            }
            other => panic!("expected BodyLengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_body_longer_than_declared_across_feeds() {
        let mut request = Request::new();
        let consumed = request
            .feed(b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nab")
            .unwrap();
        assert_eq!(consumed, 40);

        // La sobra llega junto con el último byte esperado del body
        let result = request.feed(b"cdef");
        assert!(matches!(
            result,
            Err(HttpError::BodyLengthMismatch {
                declared: 4,
                received: 6
            })
        ));
    }

    #[test]
    fn test_body_longer_than_declared_for_every_read_size() {
        let data = "POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello world";
        let body_end = data.len() - " world".len();

        for per_read in 1..=data.len() {
            // En memoria el input es completo: la sobra siempre es un error
            match Request::parse(data.as_bytes()) {
                Err(HttpError::BodyLengthMismatch { declared, received }) => {
                    assert_eq!(declared, 5);
                    assert_eq!(received, 11);
                }
                other => panic!("expected BodyLengthMismatch, got {:?}", other),
            }

            // Desde un stream solo se ve la sobra que llega junto al body
            let mut reader = ChunkReader::new(data, per_read);
            match Request::from_reader(&mut reader) {
                Ok(request) => {
                    assert_eq!(request.body(), b"hello", "with {} bytes per read", per_read);
                    assert_eq!(reader.pos, body_end, "with {} bytes per read", per_read);
                }
                Err(HttpError::BodyLengthMismatch { declared, received }) => {
                    assert_eq!(declared, 5);
                    assert!(received > declared, "with {} bytes per read", per_read);
                    assert!(reader.pos > body_end, "with {} bytes per read", per_read);
                }
                Err(other) => panic!("unexpected error with {} bytes per read: {:?}", per_read, other),
            }
        }

        assert!(parse_chunked(data, 1).is_ok());
        assert!(parse_chunked(data, data.len()).is_err());
    }

    #[test]
    fn test_parse_rejects_bytes_after_completed_request() {
        let data = format!("{}EXTRA", CURL_GET);
        let result = Request::parse(data.as_bytes());

        assert!(matches!(
            result,
            Err(HttpError::MissingContentLength) | Err(HttpError::BodyLengthMismatch { .. })
        ));
        assert!(Request::parse(CURL_GET.as_bytes()).is_ok());
    }

    #[test]
    fn test_parse_incomplete_input() {
        let data = b"GET / HTTP/1.1\r\nHost: loc";

        match Request::parse(data) {
            Err(HttpError::IncompleteRequest { state, received }) => {
                assert_eq!(state, "ParsingHeaders");
                assert_eq!(received, data.len());
            }
            other => panic!("expected IncompleteRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_request_line_too_long() {
        let data = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_LINE_LEN + 10));
        let mut reader = ChunkReader::new(&data, 1024);

        let result = Request::from_reader(&mut reader);

        assert!(matches!(result, Err(HttpError::MalformedRequestLine(_))));
        // Corta antes de leer la línea entera
        assert!(reader.pos < data.len());
    }

    #[test]
    fn test_header_line_too_long() {
        let data = format!(
            "GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n",
            "b".repeat(MAX_LINE_LEN + 10)
        );

        for per_read in [1, 100, data.len()] {
            let result = parse_chunked(&data, per_read);
            assert!(
                matches!(result, Err(HttpError::MalformedHeaderLine(_))),
                "with {} bytes per read: {:?}",
                per_read,
                result
            );
        }
    }

    #[test]
    fn test_long_line_in_memory_is_rejected() {
        let line = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_LINE_LEN));
        assert!(matches!(
            Request::parse(line.as_bytes()),
            Err(HttpError::MalformedRequestLine(_))
        ));

        let header = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "b".repeat(MAX_LINE_LEN));
        assert!(matches!(
            Request::parse(header.as_bytes()),
            Err(HttpError::MalformedHeaderLine(_))
        ));
    }

    #[test]
    fn test_header_line_within_limit_byte_by_byte() {
        let value = "v".repeat(MAX_LINE_LEN - 16);
        let data = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", value);

        let request = parse_chunked(&data, 1).unwrap();

        assert_eq!(request.header("x-big"), Some(value.as_str()));
    }

    #[test]
    fn test_body_is_not_limited_by_line_length() {
        let body = "z".repeat(MAX_LINE_LEN * 2);
        let data = format!(
            "POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let request = parse_chunked(&data, 4096).unwrap();

        assert_eq!(request.body().len(), body.len());
    }

    #[test]
    fn test_body_without_content_length() {
        let data = "POST / HTTP/1.1\r\nHost: localhost\r\n\r\nunexpected";
        let result = Request::parse(data.as_bytes());

        assert!(matches!(result, Err(HttpError::MissingContentLength)));
    }

    #[test]
    fn test_invalid_content_length() {
        for value in ["abc", "-1", "+3", ""] {
            let data = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\nabc", value);
            let result = Request::parse(data.as_bytes());

            assert!(
                matches!(result, Err(HttpError::InvalidContentLength(_))),
                "{:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_eof_before_headers_end() {
        let result = parse_chunked("GET / HTTP/1.1\r\nHost: localhost\r\n", 4);

        match result {
            Err(HttpError::IncompleteRequest { state, received }) => {
                assert_eq!(state, "ParsingHeaders");
                assert_eq!(received, 33);
            }
            other => panic!("expected IncompleteRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_stream() {
        let result = parse_chunked("", 8);

        match result {
            Err(HttpError::IncompleteRequest { state, received }) => {
                assert_eq!(state, "Initialized");
                assert_eq!(received, 0);
            }
            other => panic!("expected IncompleteRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_read_error_is_propagated() {
        struct FailingReader;

        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let result = Request::from_reader(FailingReader);
        match result {
            Err(HttpError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        struct InterruptOnce {
            inner: ChunkReader,
            interrupted: bool,
        }

        impl Read for InterruptOnce {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
                }
                self.inner.read(buf)
            }
        }

        let reader = InterruptOnce {
            inner: ChunkReader::new(CURL_GET, 3),
            interrupted: false,
        };

        assert!(Request::from_reader(reader).is_ok());
    }

    #[test]
    fn test_does_not_read_past_completed_request() {
        let data = format!("{}EXTRA", CURL_GET);
        let mut reader = ChunkReader::new(&data, 1);

        let request = Request::from_reader(&mut reader).unwrap();

        assert!(request.is_complete());
        assert_eq!(reader.pos, CURL_GET.len());
    }

    #[test]
    fn test_feed_after_completed_is_state_error() {
        let mut request = Request::parse(CURL_GET.as_bytes()).unwrap();
        let result = request.feed(b"GET / HTTP/1.1\r\n");

        assert!(matches!(
            result,
            Err(HttpError::ProtocolState {
                actual: "Completed",
                ..
            })
        ));
    }

    #[test]
    fn test_content_length_is_memoized() {
        let mut request = Request::new();
        request
            .feed(b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nab")
            .unwrap();
        assert_eq!(request.state(), ParserState::ParsingBody);

        // Cambiar el header después no afecta al largo ya leído
        request.headers.set("Content-Length", "100");
        request.feed(b"cd").unwrap();

        assert!(request.is_complete());
        assert_eq!(request.body(), b"abcd");
        assert_eq!(request.content_length(), Some(4));
    }

    #[test]
    fn test_parse_buffer_grows_and_compacts() {
        let mut buffer = ParseBuffer::with_capacity(2);
        let mut reader = ChunkReader::new("abcdef", 2);

        buffer.fill_from(&mut reader).unwrap();
        assert_eq!(buffer.filled(), b"ab");

        buffer.fill_from(&mut reader).unwrap();
        assert_eq!(buffer.filled(), b"abcd");
        assert_eq!(buffer.bytes.len(), 4);

        buffer.consume(3);
        assert_eq!(buffer.filled(), b"d");

        buffer.fill_from(&mut reader).unwrap();
        assert_eq!(buffer.filled(), b"def");
    }

    #[test]
    fn test_parse_buffer_new_line_end_only_checks_fresh_bytes() {
        let mut buffer = ParseBuffer::with_capacity(16);
        let mut reader = ChunkReader::new("GET / H\r\nTTP/1.1\r", 8);

        let read = buffer.fill_from(&mut reader).unwrap();
        assert_eq!(buffer.filled(), b"GET / H\r");
        assert!(!buffer.has_new_line_end(read));

        // El CRLF queda partido entre dos lecturas
        let read = buffer.fill_from(&mut reader).unwrap();
        assert_eq!(buffer.filled(), b"GET / H\r\nTTP/1.1");
        assert!(buffer.has_new_line_end(read));

        buffer.consume(9);
        let read = buffer.fill_from(&mut reader).unwrap();
        assert_eq!(buffer.filled(), b"TTP/1.1\r");
        assert!(!buffer.has_new_line_end(read));
    }
}
