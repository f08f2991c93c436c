//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado HTTP/1.1 que conoce el writer de
//! respuestas. La tabla código → reason phrase es fija:
//!
//! - **2xx**: Éxito (200, 201, 204)
//! - **4xx**: Error del cliente (400, 404, 405, 413)
//! - **5xx**: Error del servidor (500, 505)
//!
//! Cualquier otro código se representa con [`StatusCode::Other`] y se emite
//! con reason phrase vacío: `HTTP/1.1 418 \r\n` (el espacio se mantiene).

/// Representa un código de estado HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok,

    /// 201 Created
    Created,

    /// 204 No Content - Petición exitosa sin contenido en el body
    NoContent,

    /// 400 Bad Request - Request malformado o rechazado por el handler
    BadRequest,

    /// 404 Not Found - Target desconocido
    NotFound,

    /// 405 Method Not Allowed
    MethodNotAllowed,

    /// 413 Payload Too Large
    PayloadTooLarge,

    /// 500 Internal Server Error - Error interno del servidor
    InternalServerError,

    /// 505 HTTP Version Not Supported
    HttpVersionNotSupported,

    /// Código fuera de la tabla (sin reason phrase)
    Other(u16),
}

impl StatusCode {
    /// Convierte un número al código correspondiente
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::StatusCode;
    /// assert_eq!(StatusCode::from_u16(404), StatusCode::NotFound);
    /// assert_eq!(StatusCode::from_u16(418), StatusCode::Other(418));
    /// ```
    pub fn from_u16(code: u16) -> Self {
        match code {
            200 => StatusCode::Ok,
            201 => StatusCode::Created,
            204 => StatusCode::NoContent,
            400 => StatusCode::BadRequest,
            404 => StatusCode::NotFound,
            405 => StatusCode::MethodNotAllowed,
            413 => StatusCode::PayloadTooLarge,
            500 => StatusCode::InternalServerError,
            505 => StatusCode::HttpVersionNotSupported,
            other => StatusCode::Other(other),
        }
    }

    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::InternalServerError => 500,
            StatusCode::HttpVersionNotSupported => 505,
            StatusCode::Other(code) => *code,
        }
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// Los códigos fuera de la tabla retornan `""`.
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// assert_eq!(StatusCode::Other(299).reason_phrase(), "");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
            StatusCode::Other(_) => "",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode::from_u16(code)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK" (o "418 " para códigos sin reason phrase)
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
