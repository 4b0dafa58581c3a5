//! Authorization-code login against ion with a loopback redirect.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::callback::{CallbackExpectation, CallbackServer};
use super::error::AuthError;
use super::state::AuthState;
use super::store::TokenStore;
use super::token::AccessToken;
use crate::config::IonConfig;

/// Opens the authorization URL for the user.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> Result<(), AuthError>;
}

/// Launches the platform's default URL handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), AuthError> {
        open::that(url).map_err(|e| AuthError::BrowserLaunch(e.to_string()))
    }
}

/// Produces an ion access token, from the token store or by running the
/// browser login.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ion_publish::auth::{AuthFlow, FileTokenStore};
/// use ion_publish::config::IonConfig;
///
/// # async fn example() -> Result<(), ion_publish::auth::AuthError> {
/// let config = Arc::new(IonConfig::from_env().unwrap_or_default());
/// let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
/// let token = AuthFlow::new(config, store).authenticate().await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthFlow {
    config: Arc<IonConfig>,
    store: Arc<dyn TokenStore>,
    launcher: Arc<dyn BrowserLauncher>,
    client: reqwest::Client,
}

impl AuthFlow {
    pub fn new(config: Arc<IonConfig>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            config,
            store,
            launcher: Arc::new(SystemBrowser),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Return the cached token, or log in and cache the new one.
    ///
    /// A cached token short-circuits everything: no listener is bound and no
    /// request is sent. Persisting a fresh token is best effort; when it
    /// fails the token is still returned for this run.
    pub async fn authenticate(&self) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.store.load()? {
            debug!("using cached ion access token");
            return Ok(token);
        }

        let token = self.login().await?;
        if let Err(err) = self.store.save(&token) {
            warn!(error = %err, "could not persist ion access token");
        }
        Ok(token)
    }

    /// Run the browser login unconditionally, without touching the store.
    pub async fn login(&self) -> Result<AccessToken, AuthError> {
        let state = AuthState::generate();
        let server = CallbackServer::bind(&self.config).await?;
        let redirect_uri = server.redirect_uri();
        let authority = server.authority();
        let path = server.path().to_string();

        let url = self.authorize_url(&state, &redirect_uri)?;
        info!(%redirect_uri, "opening browser for ion authorization");
        self.launcher.open(&url)?;

        let callback = server.listen_once().await?;
        let expected = CallbackExpectation {
            authority: &authority,
            path: &path,
            state: &state,
        };
        let code = callback.validate(&expected).map_err(|reason| {
            warn!(%reason, "rejected OAuth callback");
            AuthError::Rejected(reason)
        })?;

        self.exchange_code(&code, &redirect_uri).await
    }

    /// `{ion_server}/ion/oauth?client_id=..&scope=..&state=..&response_type=code&redirect_uri=..`
    pub fn authorize_url(&self, state: &AuthState, redirect_uri: &str) -> Result<String, AuthError> {
        let scope = self.config.scope_param();
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
        ];
        url::Url::parse_with_params(&self.config.authorize_endpoint(), &params)
            .map(String::from)
            .map_err(|e| AuthError::Protocol(format!("invalid authorize endpoint: {e}")))
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<AccessToken, AuthError> {
        let endpoint = self.config.token_endpoint();
        debug!(%endpoint, "exchanging authorization code");
        let resp = self
            .client
            .post(&endpoint)
            .json(&TokenRequest {
                client_id: &self.config.client_id,
                code,
                redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(AuthError::TokenExchangeFailed(format!(
                "token endpoint returned status {}",
                resp.status()
            )));
        }
        let payload: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(format!("unreadable response: {e}")))?;
        match payload.access_token {
            Some(token) if !token.is_empty() => {
                info!("ion authorization complete");
                Ok(AccessToken::new(token))
            }
            _ => Err(AuthError::TokenExchangeFailed(
                "response missing access_token".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}
