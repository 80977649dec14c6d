//! Browser redirects at the end of a callback
//!
//! Web flows land on `{frontend}/auth/success` or `{frontend}/auth/error`.
//! Mobile flows land on the deep link the app supplied when it started the
//! flow, which must pass the configured allowlist.

use moneymon_domain::{MoneymonError, Result};
use url::Url;

use super::errors::{AuthFlowError, AuthResult};
use super::session_issuer::AuthSession;

/// Where a successful callback sends the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// The configured web frontend.
    Web,
    /// A validated mobile deep link.
    Mobile(String),
}

/// Validates mobile redirect URIs and renders final redirect URLs.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    frontend: Url,
    allowed_mobile_prefixes: Vec<String>,
}

impl RedirectPolicy {
    /// # Errors
    /// Returns `MoneymonError::Config` if `frontend_url` is not an absolute
    /// URL.
    pub fn new(frontend_url: &str, allowed_mobile_prefixes: Vec<String>) -> Result<Self> {
        let frontend = Url::parse(frontend_url)
            .map_err(|e| MoneymonError::Config(format!("invalid frontend url: {e}")))?;
        Ok(Self { frontend, allowed_mobile_prefixes })
    }

    /// Accept `uri` as a mobile redirect target.
    ///
    /// The URI must be absolute and start with one of the configured
    /// prefixes. An empty allowlist disables mobile redirects entirely.
    ///
    /// # Errors
    /// Returns `InvalidRequest` otherwise.
    pub fn validate_mobile(&self, uri: &str) -> AuthResult<()> {
        if self.allowed_mobile_prefixes.is_empty() {
            return Err(AuthFlowError::InvalidRequest(
                "mobile redirects are not configured".into(),
            ));
        }
        Url::parse(uri).map_err(|_| {
            AuthFlowError::InvalidRequest("redirectUri must be an absolute URI".into())
        })?;
        if !self.allowed_mobile_prefixes.iter().any(|prefix| uri.starts_with(prefix.as_str())) {
            return Err(AuthFlowError::InvalidRequest("redirectUri is not allowed".into()));
        }
        Ok(())
    }

    /// Redirect URL carrying the issued session.
    ///
    /// # Errors
    /// Returns `InternalFailure` if the user cannot be serialized or the
    /// stored mobile URI no longer parses.
    pub fn success_url(
        &self,
        target: &RedirectTarget,
        session: &AuthSession,
    ) -> AuthResult<String> {
        let user = serde_json::to_string(&session.user)
            .map_err(|e| AuthFlowError::InternalFailure(format!("user serialization: {e}")))?;

        let url = match target {
            RedirectTarget::Web => {
                let mut url = self.frontend_page("success");
                url.query_pairs_mut()
                    .append_pair("token", &session.token)
                    .append_pair("user", &user);
                url
            }
            RedirectTarget::Mobile(uri) => {
                let mut url = Url::parse(uri)
                    .map_err(|e| AuthFlowError::InternalFailure(format!("mobile redirect: {e}")))?;
                url.query_pairs_mut()
                    .append_pair("token", &session.token)
                    .append_pair("success", "true")
                    .append_pair("user", &user);
                url
            }
        };
        Ok(url.into())
    }

    /// Redirect URL for a failed flow.
    #[must_use]
    pub fn error_url(&self, code: &str) -> String {
        let mut url = self.frontend_page("error");
        url.query_pairs_mut().append_pair("error", code);
        url.into()
    }

    fn frontend_page(&self, page: &str) -> Url {
        let mut url = self.frontend.clone();
        let path = format!("{}/auth/{page}", self.frontend.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(None);
        url
    }
}
