//! # Headers HTTP
//! src/http/headers.rs
//!
//! Multimap de headers case-insensitive. Cada key se guarda normalizada
//! (sin espacios alrededor y en minúsculas) y los valores repetidos se
//! concatenan con `", "` en orden de inserción:
//!
//! ```text
//! Accept: text/html\r\n
//! accept: text/plain\r\n     →  {"accept": "text/html, text/plain"}
//! ```
//!
//! El parser trabaja línea por línea: nunca necesita el bloque completo de
//! headers en memoria, así que se puede alimentar byte a byte.

use crate::error::{HttpError, Result};
use std::collections::hash_map::{self, HashMap};

const CRLF: &[u8] = b"\r\n";
const KEY_VALUE_SEPARATOR: char = ':';

/// Separador usado al concatenar valores repetidos
pub const VALUE_SEPARATOR: &str = ", ";

/// Caracteres especiales permitidos en una key (RFC 9110, tokens).
/// El espacio solo se acepta dentro de la key, nunca al final.
const ALLOWED_SPECIAL_CHARS: &[char] = &[
    '!', '#', '$', '%', '&', '\'', '*', '+', '-', '.', '^', '_', '`', '|', '~', ' ',
];

/// Colección de headers con keys normalizadas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

impl Headers {
    /// Crea un conjunto de headers vacío
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Headers por defecto de una respuesta plana con un body de `body_len` bytes
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::Headers;
    ///
    /// let headers = Headers::default_response(5);
    /// assert_eq!(headers.get("Content-Length"), Some("5"));
    /// assert_eq!(headers.get("content-type"), Some("text/plain"));
    /// assert_eq!(headers.get("CONNECTION"), Some("close"));
    /// ```
    pub fn default_response(body_len: usize) -> Self {
        let mut headers = Self::new();
        headers.set("Connection", "close");
        headers.set("Content-Type", "text/plain");
        headers.set("Content-Length", &body_len.to_string());
        headers
    }

    /// Busca un header sin importar mayúsculas/minúsculas
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&normalize_key(key)).map(|v| v.as_str())
    }

    /// Verifica si existe un header
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    /// Agrega un valor. Si la key ya existe, concatena con `", "`.
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::Headers;
    ///
    /// let mut headers = Headers::new();
    /// headers.add("Host", "a");
    /// headers.add("host", "b");
    /// assert_eq!(headers.get("HOST"), Some("a, b"));
    /// ```
    pub fn add(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match self.entries.entry(normalize_key(key)) {
            hash_map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(VALUE_SEPARATOR);
                existing.push_str(value);
            }
            hash_map::Entry::Vacant(entry) => {
                entry.insert(value.to_string());
            }
        }
    }

    /// Reemplaza incondicionalmente el valor de un header
    pub fn set(&mut self, key: &str, value: &str) {
        self.entries
            .insert(normalize_key(key), value.trim().to_string());
    }

    /// Elimina un header y retorna su valor previo
    pub fn delete(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Itera los pares `(key, value)`. El orden no tiene significado.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Nombres declarados en el header `Trailer`, en el orden declarado
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::Headers;
    ///
    /// let mut headers = Headers::new();
    /// headers.add("Trailer", "X-Content-SHA256");
    /// headers.add("Trailer", "X-Content-Length");
    /// assert_eq!(headers.trailer_names(), vec!["X-Content-SHA256", "X-Content-Length"]);
    /// ```
    pub fn trailer_names(&self) -> Vec<String> {
        self.get("Trailer")
            .map(|declared| {
                declared
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parsea como máximo una línea de header desde `data`
    ///
    /// Retorna `(bytes_consumidos, done)`:
    /// - `(0, false)` si todavía no hay un CRLF: hacen falta más bytes
    /// - `(2, true)` si la línea está vacía: fin del bloque de headers
    /// - `(n, false)` si se consumió una línea `Key: Value\r\n`
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http::http::Headers;
    ///
    /// let mut headers = Headers::new();
    /// let (n, done) = headers.parse(b"Host: localhost:42069\r\n\r\n").unwrap();
    /// assert_eq!((n, done), (23, false));
    /// assert_eq!(headers.get("host"), Some("localhost:42069"));
    /// ```
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool)> {
        let Some(idx) = find_crlf(data) else {
            return Ok((0, false));
        };

        if idx == 0 {
            return Ok((CRLF.len(), true));
        }

        let raw_line = &data[..idx];
        let line = std::str::from_utf8(raw_line).map_err(|_| {
            HttpError::MalformedHeaderLine(String::from_utf8_lossy(raw_line).into_owned())
        })?;

        let (key, value) = line
            .split_once(KEY_VALUE_SEPARATOR)
            .ok_or_else(|| HttpError::MalformedHeaderLine(line.to_string()))?;

        validate_key(key)?;
        self.add(key, value);

        Ok((idx + CRLF.len(), false))
    }
}

/// Posición del primer CRLF en `data`
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|window| window == CRLF)
}

fn validate_key(key: &str) -> Result<()> {
    // "Host : x" no es válido: el espacio antes de ':' no está permitido
    if key.ends_with(' ') || key.trim().is_empty() {
        return Err(HttpError::InvalidHeaderKey(key.to_string()));
    }

    let valid = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || ALLOWED_SPECIAL_CHARS.contains(&c));

    if !valid {
        return Err(HttpError::InvalidHeaderKey(key.to_string()));
    }

    Ok(())
}
