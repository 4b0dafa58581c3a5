//! One-shot loopback listener that captures the OAuth redirect.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use super::error::{AuthError, RejectReason};
use super::state::AuthState;
use crate::config::IonConfig;
use crate::util::poll::BoundedWait;

const MAX_LINE_BYTES: u64 = 8 * 1024;
const MAX_HEADER_LINES: usize = 100;

const RESPONSE_BODY: &str = "<!DOCTYPE html>\
<html><head><meta charset=\"utf-8\"><title>Cesium ion</title></head>\
<body><h1>Cesium ion</h1>\
<p>Authorization received. You can close this window and return to your modeling application.</p>\
</body></html>";

/// The single request captured by [`CallbackServer::listen_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackResult {
    pub method: String,
    pub host: String,
    pub path: String,
    pub query: HashMap<String, String>,
}

/// What a legitimate redirect for one login attempt looks like.
#[derive(Debug)]
pub struct CallbackExpectation<'a> {
    pub authority: &'a str,
    pub path: &'a str,
    pub state: &'a AuthState,
}

impl CallbackResult {
    /// Check the redirect against `expected` and hand back the authorization code.
    pub fn validate(&self, expected: &CallbackExpectation<'_>) -> Result<String, RejectReason> {
        if self.method != "GET" {
            return Err(RejectReason::Method(self.method.clone()));
        }
        if !self.host.eq_ignore_ascii_case(expected.authority) {
            return Err(RejectReason::Host(self.host.clone()));
        }
        if self.path != expected.path {
            return Err(RejectReason::Path(self.path.clone()));
        }
        let state = self.query.get("state").ok_or(RejectReason::MissingState)?;
        if !expected.state.matches(state) {
            return Err(RejectReason::StateMismatch);
        }
        match self.query.get("code") {
            Some(code) if !code.is_empty() => Ok(code.clone()),
            _ => Err(RejectReason::MissingCode),
        }
    }
}

/// Loopback HTTP listener bound for exactly one OAuth redirect.
///
/// Binding happens up front so the redirect URI (including a port picked by
/// the OS when the configured port is `0`) is known before the browser is
/// launched. [`listen_once`](Self::listen_once) consumes the server, so the
/// port is released on every exit path.
#[derive(Debug)]
pub struct CallbackServer {
    listener: TcpListener,
    host: String,
    port: u16,
    path: String,
    wait: BoundedWait,
    read_timeout: Duration,
}

impl CallbackServer {
    pub async fn bind(config: &IonConfig) -> Result<Self, AuthError> {
        let listener =
            TcpListener::bind((config.callback_host.as_str(), config.callback_port)).await?;
        let port = listener.local_addr()?.port();
        debug!(host = %config.callback_host, port, "OAuth callback listener bound");
        Ok(Self {
            listener,
            host: config.callback_host.clone(),
            port,
            path: config.callback_path.clone(),
            wait: config.callback_wait(),
            read_timeout: config.callback_read_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AuthError> {
        Ok(self.listener.local_addr()?)
    }

    /// `host:port` as the browser will send it in the `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://{}{}", self.authority(), self.path)
    }

    /// Accept one connection, parse it, answer with a fixed page and close.
    ///
    /// The fixed 200 page is written whether or not the request parsed.
    pub async fn listen_once(self) -> Result<CallbackResult, AuthError> {
        let listener = self.listener;
        let accepted = self.wait.run(|| listener.accept()).await;
        let (stream, peer) = match accepted {
            Ok(Ok(pair)) => pair,
            Ok(Err(err)) => return Err(err.into()),
            Err(exhausted) => {
                warn!(attempts = exhausted.attempts, "no OAuth callback received");
                return Err(AuthError::Timeout {
                    attempts: exhausted.attempts,
                });
            }
        };
        debug!(%peer, "OAuth callback connection accepted");
        let result = handle_connection(stream, self.read_timeout).await;
        drop(listener);
        result
    }
}

async fn handle_connection(
    stream: TcpStream,
    read_timeout: Duration,
) -> Result<CallbackResult, AuthError> {
    let mut reader = BufReader::new(stream);
    let parsed = match tokio::time::timeout(read_timeout, read_request(&mut reader)).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Protocol(
            "timed out reading callback request".to_string(),
        )),
    };

    let mut stream = reader.into_inner();
    if let Err(err) = stream.write_all(fixed_response().as_bytes()).await {
        warn!(error = %err, "failed to write OAuth callback response");
    }
    let _ = stream.shutdown().await;
    parsed
}

async fn read_request(reader: &mut BufReader<TcpStream>) -> Result<CallbackResult, AuthError> {
    let line = read_line(reader).await?;
    let request_line = line.trim_end();
    if request_line.is_empty() {
        return Err(AuthError::Protocol("empty request line".to_string()));
    }
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| AuthError::Protocol("empty request line".to_string()))?
        .to_string();
    let target = parts
        .next()
        .ok_or_else(|| AuthError::Protocol("request line has no target".to_string()))?;
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), parse_query(query)),
        None => (target.to_string(), HashMap::new()),
    };

    // Consume the whole header block so closing the socket does not reset it.
    let mut host = None;
    for _ in 0..MAX_HEADER_LINES {
        let line = read_line(reader).await?;
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if host.is_none() && name.trim().eq_ignore_ascii_case("host") {
                host = Some(value.trim().to_string());
            }
        }
    }
    let host = host.ok_or_else(|| AuthError::Protocol("missing Host header".to_string()))?;

    Ok(CallbackResult {
        method,
        host,
        path,
        query,
    })
}

/// One CRLF-terminated line, or `""` at end of stream.
async fn read_line(reader: &mut BufReader<TcpStream>) -> Result<String, AuthError> {
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES)
        .read_until(b'\n', &mut buf)
        .await?;
    if read as u64 == MAX_LINE_BYTES && !buf.ends_with(b"\n") {
        return Err(AuthError::Protocol("request line too long".to_string()));
    }
    String::from_utf8(buf)
        .map_err(|_| AuthError::Protocol("request is not valid UTF-8".to_string()))
}

/// Split `a=1&b=2` into a map. Later duplicates replace earlier ones.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn fixed_response() -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        RESPONSE_BODY.len(),
        RESPONSE_BODY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, host: &str, path: &str, query: &[(&str, &str)]) -> CallbackResult {
        CallbackResult {
            method: method.to_string(),
            host: host.to_string(),
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn expectation(state: &AuthState) -> CallbackExpectation<'_> {
        CallbackExpectation {
            authority: "localhost:10101",
            path: "/oauth",
            state,
        }
    }

    #[test]
    fn parse_query_splits_pairs_and_decodes() {
        let query = parse_query("code=abc%2F123&state=XyZ12345&empty=");
        assert_eq!(query.get("code").map(String::as_str), Some("abc/123"));
        assert_eq!(query.get("state").map(String::as_str), Some("XyZ12345"));
        assert_eq!(query.get("empty").map(String::as_str), Some(""));
    }

    #[test]
    fn parse_query_last_duplicate_wins() {
        let query = parse_query("code=first&code=second");
        assert_eq!(query.get("code").map(String::as_str), Some("second"));
    }

    #[test]
    fn valid_redirect_yields_code() {
        let state = AuthState::generate();
        let cb = request(
            "GET",
            "localhost:10101",
            "/oauth",
            &[("code", "the-code"), ("state", state.as_str())],
        );
        assert_eq!(cb.validate(&expectation(&state)), Ok("the-code".to_string()));
    }

    #[test]
    fn each_mismatch_is_named() {
        let state = AuthState::generate();
        let exp = expectation(&state);
        let good = [("code", "c"), ("state", state.as_str())];

        assert_eq!(
            request("POST", "localhost:10101", "/oauth", &good).validate(&exp),
            Err(RejectReason::Method("POST".to_string()))
        );
        assert_eq!(
            request("GET", "evil.example:80", "/oauth", &good).validate(&exp),
            Err(RejectReason::Host("evil.example:80".to_string()))
        );
        assert_eq!(
            request("GET", "localhost:10101", "/other", &good).validate(&exp),
            Err(RejectReason::Path("/other".to_string()))
        );
        assert_eq!(
            request("GET", "localhost:10101", "/oauth", &[("code", "c")]).validate(&exp),
            Err(RejectReason::MissingState)
        );
        assert_eq!(
            request(
                "GET",
                "localhost:10101",
                "/oauth",
                &[("code", "c"), ("state", "WRONG000")]
            )
            .validate(&exp),
            Err(RejectReason::StateMismatch)
        );
        assert_eq!(
            request("GET", "localhost:10101", "/oauth", &[("state", state.as_str())])
                .validate(&exp),
            Err(RejectReason::MissingCode)
        );
    }

    #[test]
    fn response_is_complete_http() {
        let response = fixed_response();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        assert!(head.contains(&format!("Content-Length: {}", body.len())));
    }
}
