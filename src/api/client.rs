//! HTTP client wrapper for the backend REST API.
//!
//! Every call carries an `X-Request-ID` and, when a session token is held,
//! `Authorization: Bearer`. Mutating calls (POST/PUT/DELETE) echo the
//! anti-forgery cookie back as a header, the way the backend's XSRF filter
//! expects. When no cookie has been issued yet, the first mutating call is
//! preceded by a GET on its collection so the backend can set one.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{AdminConfig, AdminError, Result};

const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Cheap to clone; clones share the cookie jar and session token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    jar: Arc<Jar>,
    xsrf_cookie: String,
    xsrf_header: String,
    access_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &AdminConfig) -> Result<Self> {
        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| AdminError::Config(format!("invalid API_BASE_URL {base_url}: {e}")))?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .timeout(config.timeout)
            .cookie_provider(jar.clone())
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                jar,
                xsrf_cookie: config.xsrf_cookie_name.clone(),
                xsrf_header: config.xsrf_header_name.clone(),
                access_token: RwLock::new(config.access_token.clone()),
            }),
        })
    }

    pub fn base_url(&self) -> &str { &self.inner.base_url }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.inner.access_token.write() = token;
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Current value of the anti-forgery cookie for the API origin, if the backend has set one.
    pub fn xsrf_token(&self) -> Option<String> {
        let url = Url::parse(&self.inner.base_url).ok()?;
        let header = self.inner.jar.cookies(&url)?;
        cookie_value(header.to_str().ok()?, &self.inner.xsrf_cookie)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let body = self.send(Method::GET, path, query, None::<&()>).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let text = self.send(Method::POST, path, &[], Some(body)).await?;
        decode_mutation(&text)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let text = self.send(Method::PUT, path, &[], Some(body)).await?;
        decode_mutation(&text)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, &[], None::<&()>).await?;
        Ok(())
    }

    #[instrument(skip(self, query, body), fields(request_id = tracing::field::Empty))]
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<String> {
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        let mutating = method != Method::GET && method != Method::HEAD;
        let mut request = self
            .inner
            .http
            .request(method.clone(), self.url(path))
            .header(REQUEST_ID_HEADER, request_id.to_string());
        let bearer = self.inner.access_token.read().clone();
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        if !query.is_empty() {
            request = request.query(query);
        }
        if mutating {
            if self.xsrf_token().is_none() {
                self.prime_xsrf(path).await;
            }
            if let Some(token) = self.xsrf_token() {
                request = request.header(self.inner.xsrf_header.as_str(), token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            debug!(%method, path, status = status.as_u16(), "request completed");
            Ok(text)
        } else {
            warn!(%method, path, status = status.as_u16(), body = %truncate(&text), "request failed");
            Err(rejection(status, &text))
        }
    }

    /// GETs the collection a mutation targets so the backend issues its anti-forgery
    /// cookie. The outcome is ignored; a missing cookie surfaces on the mutation itself.
    async fn prime_xsrf(&self, path: &str) {
        let collection = path.trim_start_matches('/').split('/').next().unwrap_or_default();
        let mut request = self
            .inner
            .http
            .get(self.url(collection))
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        let bearer = self.inner.access_token.read().clone();
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        match request.send().await {
            Ok(response) => debug!(collection, status = response.status().as_u16(), "anti-forgery cookie requested"),
            Err(error) => warn!(collection, %error, "anti-forgery cookie request failed"),
        }
    }
}

/// A 2xx mutation answered with a bare JSON string is a business-rule rejection
/// (e.g. "Phone or Email already used"). An empty body decodes as `null`.
fn decode_mutation<T: DeserializeOwned>(text: &str) -> Result<T> {
    let text = if text.trim().is_empty() { "null" } else { text };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::String(message)) => Err(AdminError::Rejected(message)),
        Ok(value) => Ok(serde_json::from_value(value)?),
        Err(_) => Err(AdminError::Rejected(text.trim().to_string())),
    }
}

/// Normalizes a failed response: a string body or an object with `message` becomes a
/// rejection; everything else keeps only the status.
pub(crate) fn rejection(status: StatusCode, body: &str) -> AdminError {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(message)) if !message.is_empty() => return AdminError::Rejected(message),
        Ok(serde_json::Value::Object(map)) => {
            if let Some(message) = map.get("message").and_then(|m| m.as_str()) {
                return AdminError::Rejected(message.to_string());
            }
        }
        Ok(_) => {}
        Err(_) if status.is_client_error() && !body.trim().is_empty() => {
            return AdminError::Rejected(truncate(body.trim()));
        }
        Err(_) => {}
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AdminError::Unauthorized(status.to_string()),
        _ => AdminError::Status { status: status.as_u16() },
    }
}

fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn truncate(body: &str) -> String { body.chars().take(200).collect() }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Customer;

    #[test]
    fn test_cookie_value() {
        assert_eq!(cookie_value("a=1; XSRF-TOKEN=abc; b=2", "XSRF-TOKEN"), Some("abc".into()));
        assert_eq!(cookie_value("XSRF-TOKEN=", "XSRF-TOKEN"), None);
        assert_eq!(cookie_value("MY-XSRF-TOKEN=zzz", "XSRF-TOKEN"), None);
    }

    #[test]
    fn test_rejection_shapes() {
        let e = rejection(StatusCode::BAD_REQUEST, r#""Email already used""#);
        assert!(matches!(e, AdminError::Rejected(ref m) if m == "Email already used"));

        let e = rejection(StatusCode::CONFLICT, r#"{"message":"Phone already used","code":7}"#);
        assert!(matches!(e, AdminError::Rejected(ref m) if m == "Phone already used"));

        let e = rejection(StatusCode::BAD_REQUEST, "plain text reason");
        assert!(matches!(e, AdminError::Rejected(ref m) if m == "plain text reason"));

        assert!(matches!(rejection(StatusCode::INTERNAL_SERVER_ERROR, "<html>"), AdminError::Status { status: 500 }));
        assert!(matches!(rejection(StatusCode::FORBIDDEN, ""), AdminError::Unauthorized(_)));
        assert!(matches!(rejection(StatusCode::BAD_GATEWAY, r#"{"detail":"x"}"#), AdminError::Status { status: 502 }));
    }

    #[test]
    fn test_decode_mutation() {
        let rejected = decode_mutation::<Customer>(r#""Phone or Email already used""#).unwrap_err();
        assert_eq!(rejected.user_message("x"), "Phone or Email already used");

        let empty: Option<Customer> = decode_mutation("").unwrap();
        assert!(empty.is_none());

        let c: Customer = decode_mutation(r#"{"customerID":5,"firstName":"A","lastName":"B","phone":"1","email":"a@b.co"}"#).unwrap();
        assert_eq!(c.customer_id.value(), 5);
    }

    #[test]
    fn test_url_join() {
        let client = ApiClient::new(&AdminConfig::default().with_base_url("http://localhost:5000/api/")).unwrap();
        assert_eq!(client.url("/products/42"), "http://localhost:5000/api/products/42");
        assert!(client.xsrf_token().is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new(&AdminConfig::default().with_base_url("not a url")), Err(AdminError::Config(_))));
    }
}
