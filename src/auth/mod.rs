//! Loopback OAuth login and access-token storage.

pub mod callback;
pub mod error;
pub mod flow;
pub mod state;
pub mod store;
pub mod token;

pub use callback::{CallbackExpectation, CallbackResult, CallbackServer};
pub use error::{AuthError, RejectReason};
pub use flow::{AuthFlow, BrowserLauncher, SystemBrowser};
pub use state::AuthState;
pub use store::{FileTokenStore, TokenStore};
pub use token::AccessToken;
