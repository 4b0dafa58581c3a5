//! CLI auth command handlers for login, status, and logout.

use std::sync::Arc;

use crate::auth::{AuthFlow, FileTokenStore, TokenStore};
use crate::config::IonConfig;

/// Handle `ion-publish auth login`.
pub async fn handle_login(config: Arc<IonConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let flow = AuthFlow::new(config.clone(), store.clone());

    println!("🔗 Opening your browser to authorize with Cesium ion...");
    println!(
        "⏳ Waiting up to {}s for the redirect to {}",
        config.callback_wait().budget().as_secs(),
        config.redirect_uri()
    );

    let token = flow.login().await?;
    match store.save(&token) {
        Ok(()) => println!("✅ Logged in. Token saved to {}", store.path().display()),
        Err(e) => println!("⚠️  Logged in, but the token could not be saved: {e}"),
    }
    Ok(())
}

/// Handle `ion-publish auth status`.
pub async fn handle_status(config: Arc<IonConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileTokenStore::new(config.token_path.clone());

    println!("🔐 Authentication Status\n");
    match store.load() {
        Ok(Some(_)) => println!("  Cesium ion: ✅ Logged in ({})", store.path().display()),
        Ok(None) => println!("  Cesium ion: ❌ Not logged in"),
        Err(e) => println!("  Cesium ion: ⚠️  Error: {e}"),
    }
    println!("  API server: {}", config.api_server);
    Ok(())
}

/// Handle `ion-publish auth logout`.
pub async fn handle_logout(config: Arc<IonConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileTokenStore::new(config.token_path.clone());
    store.clear()?;
    println!("✅ Logged out from Cesium ion");
    Ok(())
}
