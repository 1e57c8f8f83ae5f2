//! HTTP transport
//!
//! Providers talk to their catalogs through the `Transport` trait so that the
//! search logic never depends on a concrete HTTP client. A `Connector` opens a
//! fresh session per provider lifecycle.

use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while talking to a remote catalog
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// A blocking session able to fetch remote resources.
pub trait Transport {
    /// Fetches `url` with the given query parameters and cookies.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Status` for non-success responses and
    /// `TransportError::RequestFailed` when the request itself fails.
    fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
        cookies: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Opens transport sessions.
pub trait Connector {
    type Session: Transport;

    /// Opens a new session.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::RequestFailed` if the session cannot be built.
    fn connect(&self) -> Result<Self::Session, TransportError>;
}

/// Connector producing `reqwest` blocking sessions.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    user_agent: String,
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

impl Connector for HttpConnector {
    type Session = HttpSession;

    fn connect(&self) -> Result<HttpSession, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(HttpSession { client })
    }
}

/// A session backed by a `reqwest` blocking client.
pub struct HttpSession {
    client: reqwest::blocking::Client,
}

impl Transport for HttpSession {
    fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
        cookies: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut request = self.client.get(url);

        if !params.is_empty() {
            request = request.query(params);
        }

        if let Some(header) = cookie_header(cookies) {
            request = request.header(reqwest::header::COOKIE, header);
        }

        let response = request
            .send()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let status = response.status();
        debug!("GET {} -> {}", response.url(), status.as_u16());

        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| TransportError::RequestFailed(e.to_string()))
    }
}

/// Renders cookies as a `Cookie` header value.
fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    Some(
        cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header() {
        assert_eq!(cookie_header(&BTreeMap::new()), None);

        let cookies = BTreeMap::from([
            ("LanguageFilter".to_string(), "13,2".to_string()),
            ("ForeignOnly".to_string(), "False".to_string()),
        ]);
        assert_eq!(
            cookie_header(&cookies).as_deref(),
            Some("ForeignOnly=False; LanguageFilter=13,2")
        );
    }

    #[test]
    fn test_connector_builds_session() {
        let connector = HttpConnector::new("subscout-test", Duration::from_secs(5));
        assert!(connector.connect().is_ok());
    }
}
