//! Firebase Realtime Database REST adapter.
//!
//! Implements [`RemoteStore`] over the database's REST surface: every node
//! is addressable as `https://<host><path>.json`, with
//!
//! | Operation | Method   | Body                  |
//! |-----------|----------|-----------------------|
//! | `get`     | `GET`    |                       |
//! | `set`     | `PUT`    | value                 |
//! | `update`  | `PATCH`  | object of children    |
//! | `push`    | `POST`   | value → `{"name":k}`  |
//! | `delete`  | `DELETE` |                       |
//!
//! URL building, status mapping and body parsing are plain functions so
//! they are exercised on the host; the HTTP client itself is cfg-gated to
//! `target_os = "espidf"`.

use serde_json::Value;

use crate::error::TransportError;

/// Connection parameters for one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    /// Database host, e.g. `toxirover-default-rtdb.firebaseio.com`.
    pub host: String,
    /// Legacy database secret or ID token; `None` for open rules.
    pub auth: Option<String>,
    pub timeout_ms: u32,
}

impl FirebaseConfig {
    /// Read `FIREBASE_HOST` / `FIREBASE_AUTH` baked in at build time.
    pub fn from_build_env(timeout_ms: u32) -> Option<Self> {
        let host = option_env!("FIREBASE_HOST")?.trim();
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_owned(),
            auth: option_env!("FIREBASE_AUTH")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_owned),
            timeout_ms,
        })
    }
}

/// REST URL for the node at `path`.
pub fn node_url(host: &str, path: &str, auth: Option<&str>) -> String {
    let host = host.trim_end_matches('/');
    let scheme = if host.starts_with("http://") || host.starts_with("https://") {
        ""
    } else {
        "https://"
    };
    let path = path.trim_matches('/');
    let mut url = format!("{scheme}{host}/{path}.json");
    if let Some(auth) = auth {
        url.push_str("?auth=");
        url.push_str(auth);
    }
    url
}

/// Map an HTTP status to a transport result.
pub fn check_status(status: u16) -> Result<(), TransportError> {
    match status {
        200..=299 => Ok(()),
        other => Err(TransportError::Rejected(other)),
    }
}

/// Parse a response body.  Empty bodies and JSON `null` are absent nodes.
pub fn parse_body(body: &[u8]) -> Result<Option<Value>, TransportError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(TransportError::Malformed),
    }
}

/// Extract the generated key from a `POST` response (`{"name": "-N…"}`).
pub fn parse_push_key(body: &[u8]) -> Result<String, TransportError> {
    match parse_body(body)? {
        Some(Value::Object(map)) => match map.get("name") {
            Some(Value::String(key)) => Ok(key.clone()),
            _ => Err(TransportError::Malformed),
        },
        _ => Err(TransportError::Malformed),
    }
}

#[cfg(target_os = "espidf")]
pub use esp::FirebaseRestStore;

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;

    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use log::{debug, warn};
    use serde_json::Value;

    use super::{FirebaseConfig, check_status, node_url, parse_body, parse_push_key};
    use crate::app::ports::RemoteStore;
    use crate::error::TransportError;

    /// Largest response body read back.  Command nodes are tiny; a larger
    /// body means the path points somewhere unexpected.
    const MAX_BODY: usize = 2048;

    /// Blocking REST client, one request at a time.
    pub struct FirebaseRestStore {
        config: FirebaseConfig,
        body: Vec<u8>,
    }

    impl FirebaseRestStore {
        pub fn new(config: FirebaseConfig) -> Self {
            Self {
                config,
                body: Vec::with_capacity(MAX_BODY),
            }
        }

        fn request(
            &mut self,
            method: Method,
            path: &str,
            payload: Option<&Value>,
        ) -> Result<&[u8], TransportError> {
            let url = node_url(&self.config.host, path, self.config.auth.as_deref());
            let mut conn = EspHttpConnection::new(&Configuration {
                timeout: Some(Duration::from_millis(u64::from(self.config.timeout_ms))),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            })
            .map_err(|e| {
                warn!("firebase: client init failed: {e}");
                TransportError::Unreachable
            })?;

            let body = match payload {
                Some(v) => serde_json::to_vec(v).map_err(|_| TransportError::Malformed)?,
                None => Vec::new(),
            };
            let len = body.len().to_string();
            let headers = [
                ("Content-Type", "application/json"),
                ("Content-Length", len.as_str()),
            ];

            conn.initiate_request(method, &url, &headers)
                .map_err(|_| TransportError::Unreachable)?;
            let mut written = 0;
            while written < body.len() {
                let n = conn
                    .write(&body[written..])
                    .map_err(|_| TransportError::Unreachable)?;
                if n == 0 {
                    return Err(TransportError::Unreachable);
                }
                written += n;
            }
            conn.initiate_response()
                .map_err(|_| TransportError::Unreachable)?;

            let status = conn.status();
            debug!("firebase: {:?} {} -> {}", method, path, status);
            check_status(status)?;

            self.body.clear();
            let mut chunk = [0u8; 256];
            loop {
                let n = conn
                    .read(&mut chunk)
                    .map_err(|_| TransportError::Unreachable)?;
                if n == 0 {
                    break;
                }
                if self.body.len() + n > MAX_BODY {
                    return Err(TransportError::Malformed);
                }
                self.body.extend_from_slice(&chunk[..n]);
            }
            Ok(&self.body)
        }
    }

    impl RemoteStore for FirebaseRestStore {
        fn get(&mut self, path: &str) -> Result<Option<Value>, TransportError> {
            let body = self.request(Method::Get, path, None)?;
            parse_body(body)
        }

        fn set(&mut self, path: &str, value: &Value) -> Result<(), TransportError> {
            self.request(Method::Put, path, Some(value)).map(|_| ())
        }

        fn update(&mut self, path: &str, fields: &Value) -> Result<(), TransportError> {
            if !fields.is_object() {
                return Err(TransportError::Malformed);
            }
            self.request(Method::Patch, path, Some(fields)).map(|_| ())
        }

        fn push(&mut self, path: &str, value: &Value) -> Result<String, TransportError> {
            let body = self.request(Method::Post, path, Some(value))?;
            parse_push_key(body)
        }

        fn delete(&mut self, path: &str) -> Result<(), TransportError> {
            self.request(Method::Delete, path, None).map(|_| ())
        }
    }
}
