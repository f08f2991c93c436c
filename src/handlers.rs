//! # Handler de Demostración
//! src/handlers.rs
//!
//! Rutas que usa el binario para ejercitar el writer de punta a punta:
//!
//! | Target          | Respuesta                                        |
//! |-----------------|--------------------------------------------------|
//! | `/`             | 200 con una página HTML                          |
//! | `/yourproblem`  | 400 (error del handler, texto plano)             |
//! | `/myproblem`    | 500 (error del handler, texto plano)             |
//! | `/stream/<n>`   | 200 chunked con `n` líneas y trailers de control |
//! | otro            | 404                                              |

use crate::config::Config;
use crate::http::{Headers, Request, StatusCode};
use crate::server::{ConnWriter, Handler, HandlerError};
use sha2::{Digest, Sha256};

/// Máximo de líneas que acepta `/stream/<n>`
pub const MAX_STREAM_LINES: usize = 100;

const STREAM_PREFIX: &str = "/stream/";

const SUCCESS_PAGE: &str = "<html>
<head>
<title>200 OK</title>
</head>
<body>
<h1>Success!</h1>
<p>raw_http parsed your request byte by byte.</p>
</body>
</html>
";

/// Handler con las rutas de demostración
#[derive(Debug, Clone)]
pub struct DemoHandler {
    chunk_size: usize,
}

impl DemoHandler {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.stream_chunk_size)
    }

    fn index(&self, w: &mut ConnWriter<'_>) -> Result<(), HandlerError> {
        let mut headers = Headers::default_response(SUCCESS_PAGE.len());
        headers.set("Content-Type", "text/html");

        w.write_status_line(StatusCode::Ok)?;
        w.write_headers(&headers)?;
        w.write_body(SUCCESS_PAGE.as_bytes())?;
        Ok(())
    }

    /// Body chunked de `count` líneas, seguido de su hash y largo como trailers
    fn stream(&self, w: &mut ConnWriter<'_>, count: &str) -> Result<(), HandlerError> {
        let lines = parse_line_count(count)?;
        let body = stream_body(lines);

        let mut headers = Headers::new();
        headers.set("Transfer-Encoding", "chunked");
        headers.add("Trailer", "X-Content-SHA256");
        headers.add("Trailer", "X-Content-Length");

        w.write_status_line(StatusCode::Ok)?;
        w.write_headers(&headers)?;

        let mut hasher = Sha256::new();
        for chunk in body.as_bytes().chunks(self.chunk_size) {
            hasher.update(chunk);
            w.write_chunked_body(chunk)?;
        }
        w.write_chunked_body_done()?;

        let mut trailers = Headers::new();
        trailers.set("X-Content-SHA256", &format!("{:x}", hasher.finalize()));
        trailers.set("X-Content-Length", &body.len().to_string());
        w.write_trailers(&trailers)?;

        tracing::debug!(lines, bytes = body.len(), "stream sent");
        Ok(())
    }
}

impl Handler for DemoHandler {
    fn handle(&self, w: &mut ConnWriter<'_>, req: &Request) -> Result<(), HandlerError> {
        match req.target() {
            "/" => self.index(w),
            "/yourproblem" => Err(HandlerError::new(
                StatusCode::BadRequest,
                "Your request honestly kinda sucked.\n",
            )),
            "/myproblem" => Err(HandlerError::new(
                StatusCode::InternalServerError,
                "Okay, you know what? This one is on me.\n",
            )),
            target => match target.strip_prefix(STREAM_PREFIX) {
                Some(count) => self.stream(w, count),
                None => Err(HandlerError::new(
                    StatusCode::NotFound,
                    format!("no route for {}\n", target),
                )),
            },
        }
    }
}

fn parse_line_count(raw: &str) -> Result<usize, HandlerError> {
    raw.parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_STREAM_LINES).contains(n))
        .ok_or_else(|| {
            HandlerError::new(
                StatusCode::BadRequest,
                format!("stream length must be between 1 and {}, got {:?}\n", MAX_STREAM_LINES, raw),
            )
        })
}

fn stream_body(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("{{\"id\": {}, \"message\": \"streamed by raw_http\"}}\n", i))
        .collect()
}
