use base64::Engine as _;
use rand::distributions::Alphanumeric;
use rand::Rng;
use ring::hmac;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Credentials;

/// Signs feed requests with OAuth 1.0a (HMAC-SHA1, user context).
pub struct OAuthSigner {
    credentials: Credentials,
}

impl OAuthSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn timestamp_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn nonce() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }

    /// Build the `Authorization` header value for a request.
    ///
    /// `url` must not carry a query string; query and form parameters go in
    /// `params` so they are covered by the signature.
    pub fn authorization(&self, method: &str, url: &str, params: &[(String, String)]) -> String {
        self.authorization_with(method, url, params, &Self::nonce(), Self::timestamp_secs())
    }

    fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: u64,
    ) -> String {
        let mut oauth = vec![
            ("oauth_consumer_key".to_string(), self.credentials.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.credentials.access_token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let all: Vec<(String, String)> = params.iter().chain(oauth.iter()).cloned().collect();
        let base = signature_base(method, url, &all);
        oauth.push(("oauth_signature".to_string(), self.sign(&base)));

        let fields = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {}", fields)
    }

    fn sign(&self, base: &str) -> String {
        let signing_key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.access_token_secret)
        );
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, signing_key.as_bytes());
        let tag = hmac::sign(&key, base.as_bytes());
        base64::engine::general_purpose::STANDARD.encode(tag.as_ref())
    }
}

/// RFC 3986 percent-encoding (unreserved characters kept as-is).
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `METHOD&url&params` with params encoded, sorted, and joined.
fn signature_base(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    )
}
