use std::fmt;

/// Opaque ion access token.
///
/// The value never appears in `Debug` output so it can travel through
/// structured logs and error chains safely.
///
/// # Example
/// ```
/// use ion_publish::auth::AccessToken;
///
/// let token = AccessToken::new("eyJhbGciOi...");
/// assert_eq!(token.secret(), "eyJhbGciOi...");
/// assert_eq!(format!("{token:?}"), "AccessToken(..)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
