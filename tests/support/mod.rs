#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ion_publish::assets::{ObjectSink, SinkFactory, UploadError, UploadLocation};
use ion_publish::auth::{AccessToken, AuthError, BrowserLauncher, TokenStore};
use ion_publish::config::IonConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// Config pointing at a mock API with a loopback listener on a free port.
pub fn test_config(api_server: &str) -> IonConfig {
    IonConfig::new()
        .with_api_server(api_server)
        .with_ion_server(api_server)
        .with_client_id("test-client")
        .with_callback_address("127.0.0.1", 0)
        .with_callback_wait(Duration::from_millis(20), 100)
        .with_callback_read_timeout(Duration::from_secs(2))
        .with_status_poll_interval(Duration::from_millis(10))
}

// ---------------------------------------------------------------------------
// Token store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<AccessToken>>,
    fail_saves: bool,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(token: &str) -> Self {
        let store = Self::default();
        *store.token.lock().expect("store lock poisoned") = Some(AccessToken::new(token));
        store
    }

    pub fn failing_saves() -> Self {
        Self {
            token: Mutex::new(None),
            fail_saves: true,
        }
    }

    pub fn get(&self) -> Option<AccessToken> {
        self.token.lock().expect("store lock poisoned").clone()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<AccessToken>, AuthError> {
        Ok(self.get())
    }

    fn save(&self, token: &AccessToken) -> Result<(), AuthError> {
        if self.fail_saves {
            return Err(AuthError::Io("read-only home directory".to_string()));
        }
        *self.token.lock().expect("store lock poisoned") = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.token.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

/// Records every put; optionally fails on one key or at connect time.
#[derive(Default)]
pub struct RecordingSinkFactory {
    puts: Arc<Mutex<Vec<(String, Bytes)>>>,
    connects: Mutex<Vec<UploadLocation>>,
    fail_on: Option<String>,
    fail_connect: bool,
}

impl RecordingSinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(key: &str) -> Self {
        Self {
            fail_on: Some(key.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_connect() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.puts
            .lock()
            .expect("sink lock poisoned")
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn body(&self, key: &str) -> Option<Bytes> {
        self.puts
            .lock()
            .expect("sink lock poisoned")
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, b)| b.clone())
    }

    pub fn connections(&self) -> Vec<UploadLocation> {
        self.connects.lock().expect("sink lock poisoned").clone()
    }
}

impl SinkFactory for RecordingSinkFactory {
    fn connect(&self, location: &UploadLocation) -> Result<Arc<dyn ObjectSink>, UploadError> {
        self.connects
            .lock()
            .expect("sink lock poisoned")
            .push(location.clone());
        if self.fail_connect {
            return Err(UploadError::Config("credentials rejected".to_string()));
        }
        Ok(Arc::new(RecordingSink {
            puts: self.puts.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }
}

struct RecordingSink {
    puts: Arc<Mutex<Vec<(String, Bytes)>>>,
    fail_on: Option<String>,
}

#[async_trait]
impl ObjectSink for RecordingSink {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), UploadError> {
        self.puts
            .lock()
            .expect("sink lock poisoned")
            .push((key.to_string(), body));
        if self.fail_on.as_deref() == Some(key) {
            return Err(UploadError::Storage {
                key: key.to_string(),
                message: "access denied".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

/// The authorization URL as the browser would have received it.
pub struct AuthorizeRequest {
    pub params: HashMap<String, String>,
    pub redirect: url::Url,
}

impl AuthorizeRequest {
    pub fn state(&self) -> &str {
        &self.params["state"]
    }

    pub fn authority(&self) -> String {
        format!(
            "{}:{}",
            self.redirect.host_str().expect("redirect host"),
            self.redirect.port().expect("redirect port")
        )
    }

    /// A well-formed redirect request carrying `query`.
    pub fn redirect_with(&self, query: &str) -> String {
        format!(
            "GET {}?{} HTTP/1.1\r\nHost: {}\r\nUser-Agent: test-browser\r\n\r\n",
            self.redirect.path(),
            query,
            self.authority()
        )
    }

    /// The redirect a real ion authorization would produce.
    pub fn approve(&self, code: &str) -> String {
        self.redirect_with(&format!("code={code}&state={}", self.state()))
    }
}

type Script = dyn Fn(&AuthorizeRequest) -> Option<String> + Send + Sync;

/// Plays the browser: on `open`, optionally sends a raw request to the
/// redirect URI and keeps the listener's reply.
pub struct ScriptedBrowser {
    script: Box<Script>,
    opened: Mutex<Vec<String>>,
    replies: Mutex<Vec<JoinHandle<String>>>,
}

impl ScriptedBrowser {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&AuthorizeRequest) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            opened: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
        }
    }

    /// Never follows the redirect.
    pub fn idle() -> Self {
        Self::new(|_| None)
    }

    pub fn approving(code: &'static str) -> Self {
        Self::new(move |req| Some(req.approve(code)))
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("browser lock poisoned").clone()
    }

    /// Raw HTTP replies the callback listener sent back.
    pub async fn replies(&self) -> Vec<String> {
        let handles = std::mem::take(&mut *self.replies.lock().expect("browser lock poisoned"));
        let mut out = Vec::new();
        for handle in handles {
            out.push(handle.await.expect("browser task"));
        }
        out
    }
}

impl BrowserLauncher for ScriptedBrowser {
    fn open(&self, url: &str) -> Result<(), AuthError> {
        self.opened
            .lock()
            .expect("browser lock poisoned")
            .push(url.to_string());
        let parsed = url::Url::parse(url).expect("authorize url");
        let params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
        let redirect = url::Url::parse(&params["redirect_uri"]).expect("redirect uri");
        let request = AuthorizeRequest { params, redirect };

        if let Some(raw) = (self.script)(&request) {
            let addr = request.authority();
            let handle = tokio::spawn(async move { send_raw(&addr, &raw).await });
            self.replies
                .lock()
                .expect("browser lock poisoned")
                .push(handle);
        }
        Ok(())
    }
}

/// Write `raw` to `addr` and read the reply until the peer closes.
pub async fn send_raw(addr: &str, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect to callback");
    stream.write_all(raw.as_bytes()).await.expect("write request");
    let mut reply = String::new();
    let _ = stream.read_to_string(&mut reply).await;
    reply
}
