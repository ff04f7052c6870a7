//! Console configuration.
//!
//! Read from the process environment (after `.env` is loaded by the binary):
//!
//! - `API_BASE_URL`: required REST base URL
//! - `HTTP_TIMEOUT_SECS`: optional request timeout (default: 30)
//! - `DEFAULT_PAGE_SIZE`: optional initial page size (default: 10)
//! - `XSRF_COOKIE_NAME` / `XSRF_HEADER_NAME`: anti-forgery names
//! - `AUTH_DOMAIN`, `AUTH_CLIENT_ID`, `AUTH_REDIRECT_URI`: identity provider
//! - `ROLES_CLAIM`: identity-token claim holding the role list
//! - `ADMIN_ACCESS_TOKEN`, `ADMIN_ID_TOKEN`: session tokens

use std::time::Duration;

use crate::{AdminError, Result};

pub const DEFAULT_XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const DEFAULT_XSRF_HEADER: &str = "X-XSRF-TOKEN";
pub const DEFAULT_ROLES_CLAIM: &str = "https://uladzislau.dev/claims/roles";

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub default_page_size: u32,
    pub xsrf_cookie_name: String,
    pub xsrf_header_name: String,
    pub auth: AuthConfig,
    pub access_token: Option<String>,
    pub id_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub domain: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub roles_claim: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            client_id: String::new(),
            redirect_uri: "http://localhost:4200".to_string(),
            roles_claim: DEFAULT_ROLES_CLAIM.to_string(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            timeout: Duration::from_secs(30),
            default_page_size: 10,
            xsrf_cookie_name: DEFAULT_XSRF_COOKIE.to_string(),
            xsrf_header_name: DEFAULT_XSRF_HEADER.to_string(),
            auth: AuthConfig::default(),
            access_token: None,
            id_token: None,
        }
    }
}

impl AdminConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let api_base_url = lookup("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AdminError::Config("API_BASE_URL not set".to_string()))?;

        let timeout_secs = lookup("HTTP_TIMEOUT_SECS").and_then(|s| s.parse().ok()).unwrap_or(30);
        let default_page_size = lookup("DEFAULT_PAGE_SIZE")
            .and_then(|s| s.parse().ok())
            .filter(|size: &u32| *size > 0)
            .unwrap_or(defaults.default_page_size);

        let auth = AuthConfig {
            domain: lookup("AUTH_DOMAIN").unwrap_or_default(),
            client_id: lookup("AUTH_CLIENT_ID").unwrap_or_default(),
            redirect_uri: lookup("AUTH_REDIRECT_URI").unwrap_or(defaults.auth.redirect_uri),
            roles_claim: lookup("ROLES_CLAIM").unwrap_or(defaults.auth.roles_claim),
        };

        Ok(Self {
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
            default_page_size,
            xsrf_cookie_name: lookup("XSRF_COOKIE_NAME").unwrap_or(defaults.xsrf_cookie_name),
            xsrf_header_name: lookup("XSRF_HEADER_NAME").unwrap_or(defaults.xsrf_header_name),
            auth,
            access_token: lookup("ADMIN_ACCESS_TOKEN").filter(|t| !t.is_empty()),
            id_token: lookup("ADMIN_ID_TOKEN").filter(|t| !t.is_empty()),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size.max(1);
        self
    }

    pub fn with_tokens(mut self, access_token: Option<String>, id_token: Option<String>) -> Self {
        self.access_token = access_token;
        self.id_token = id_token;
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }
}
