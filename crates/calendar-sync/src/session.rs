use std::fmt;

use crate::config::GoogleConfig;

/// Everything needed to mint access tokens for one user's calendar.
///
/// Built once per user and only ever borrowed by the fetcher; token refresh
/// happens inside the authenticator built from it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: String,
}

impl SessionConfig {
    pub fn new(google: &GoogleConfig, refresh_token: impl Into<String>) -> Self {
        Self {
            client_id: google.client_id.clone(),
            client_secret: google.client_secret.clone(),
            redirect_uri: google.redirect_uri.clone(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
