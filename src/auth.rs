//! Session and route gate.
//!
//! Sign-in happens at an external OpenID provider. The console keeps the
//! tokens it was handed, reads the identity token's claims (roles live under a
//! namespaced custom claim) and decides per route whether to let the user in.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::AuthConfig;
use crate::{AdminError, Result};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Clone, Debug, Default)]
pub struct Session {
    access_token: Option<String>,
    claims: Option<Map<String, Value>>,
}

impl Session {
    pub fn anonymous() -> Self { Self::default() }

    /// Builds a session from the provider's tokens. A malformed identity token is an error,
    /// a missing one leaves the session unauthenticated.
    pub fn from_tokens(access_token: Option<String>, id_token: Option<&str>) -> Result<Self> {
        let claims = id_token.map(decode_claims).transpose()?;
        Ok(Self { access_token, claims })
    }

    pub fn access_token(&self) -> Option<&str> { self.access_token.as_deref() }

    pub fn claims(&self) -> Option<&Map<String, Value>> { self.claims.as_ref() }

    pub fn is_authenticated(&self) -> bool { self.is_authenticated_at(Utc::now()) }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        match &self.claims {
            None => false,
            Some(claims) => match claims.get("exp").and_then(Value::as_i64) {
                Some(exp) => Utc.timestamp_opt(exp, 0).single().map_or(false, |exp| exp > now),
                None => true,
            },
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.claims.as_ref()?.get("exp")?.as_i64()?;
        Utc.timestamp_opt(exp, 0).single()
    }

    pub fn roles(&self, roles_claim: &str) -> Vec<String> {
        match self.claims.as_ref().and_then(|c| c.get(roles_claim)) {
            Some(Value::Array(items)) => items.iter().filter_map(|r| r.as_str().map(str::to_string)).collect(),
            Some(Value::String(single)) => vec![single.clone()],
            _ => Vec::new(),
        }
    }

    pub fn has_role(&self, roles_claim: &str, role: &str) -> bool {
        self.roles(roles_claim).iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, roles_claim: &str, wanted: &[&str]) -> bool {
        let roles = self.roles(roles_claim);
        wanted.iter().any(|w| roles.iter().any(|r| r == w))
    }

    pub fn display_name(&self) -> Option<String> {
        let claims = self.claims.as_ref()?;
        ["name", "nickname", "email", "sub"]
            .iter()
            .find_map(|key| claims.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }
}

/// Reads the payload segment of a JWT without verifying the signature; the backend verifies
/// the access token on every call.
fn decode_claims(token: &str) -> Result<Map<String, Value>> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AdminError::Unauthorized("identity token is not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AdminError::Unauthorized(format!("identity token payload: {e}")))?;
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(AdminError::Unauthorized("identity token payload is not an object".to_string())),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route { Dashboard, Customers, Categories, Products, Orders }

impl Route {
    pub const ALL: [Route; 5] = [Route::Dashboard, Route::Customers, Route::Categories, Route::Products, Route::Orders];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Dashboard => "",
            Self::Customers => "customers",
            Self::Categories => "categories",
            Self::Products => "products",
            Self::Orders => "orders",
        }
    }

    pub fn required_role(&self) -> Option<&'static str> {
        match self { Self::Orders => Some(ADMIN_ROLE), _ => None }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Dashboard => write!(f, "dashboard"), other => write!(f, "{}", other.path()) }
    }
}

impl FromStr for Route {
    type Err = AdminError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim_matches('/') {
            "" | "dashboard" => Ok(Self::Dashboard),
            "customers" => Ok(Self::Customers),
            "categories" => Ok(Self::Categories),
            "products" => Ok(Self::Products),
            "orders" => Ok(Self::Orders),
            other => Err(AdminError::Config(format!("unknown route: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access { Granted, Denied(DenyReason) }

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DenyReason { NotAuthenticated, MissingRole(&'static str) }

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "Sign-in required"),
            Self::MissingRole(role) => write!(f, "The '{}' role is required", role),
        }
    }
}

pub struct AuthGate {
    config: AuthConfig,
}

impl AuthGate {
    pub fn new(config: AuthConfig) -> Self { Self { config } }

    pub fn roles_claim(&self) -> &str { &self.config.roles_claim }

    pub fn can_activate(&self, session: &Session, route: Route) -> Access {
        self.can_activate_at(session, route, Utc::now())
    }

    pub fn can_activate_at(&self, session: &Session, route: Route, now: DateTime<Utc>) -> Access {
        if !session.is_authenticated_at(now) {
            debug!(%route, "route denied: not authenticated");
            return Access::Denied(DenyReason::NotAuthenticated);
        }
        if let Some(role) = route.required_role() {
            if !session.has_role(&self.config.roles_claim, role) {
                debug!(%route, role, "route denied: missing role");
                return Access::Denied(DenyReason::MissingRole(role));
            }
        }
        Access::Granted
    }

    /// Provider authorize URL; the requested route travels in `state`.
    pub fn login_url(&self, return_to: Route) -> Result<String> {
        let base = self.provider_url("authorize")?;
        let url = Url::parse_with_params(base.as_str(), &[
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", "openid profile email"),
            ("state", return_to.path()),
        ]).map_err(|e| AdminError::Config(format!("login url: {e}")))?;
        Ok(url.to_string())
    }

    pub fn logout_url(&self) -> Result<String> {
        let base = self.provider_url("v2/logout")?;
        let url = Url::parse_with_params(base.as_str(), &[
            ("client_id", self.config.client_id.as_str()),
            ("returnTo", self.config.redirect_uri.as_str()),
        ]).map_err(|e| AdminError::Config(format!("logout url: {e}")))?;
        Ok(url.to_string())
    }

    fn provider_url(&self, path: &str) -> Result<Url> {
        let domain = self.config.domain.trim().trim_end_matches('/');
        if domain.is_empty() {
            return Err(AdminError::Config("AUTH_DOMAIN not set".to_string()));
        }
        let root = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        };
        Url::parse(&format!("{root}/{path}")).map_err(|e| AdminError::Config(format!("AUTH_DOMAIN: {e}")))
    }
}
