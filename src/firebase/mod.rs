pub mod models;

use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    config::Config,
    store::{
        models::{HistoryEntry, StoredReading},
        SensorStore,
    },
};

use self::models::{Claims, PushResponse, TokenResponse};

/// OAuth2 scopes required for Realtime Database REST access.
const SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email \
                     https://www.googleapis.com/auth/firebase.database";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Both projections live under one logical namespace: the single latest
/// record and the sibling append-only history collection.
const LATEST_PATH: &str = "Tambak/DataTerbaru";
const HISTORY_PATH: &str = "Tambak/History";
/// Scratch node used by the connectivity probe.
const PROBE_PATH: &str = "test";

/// Firebase Realtime Database client speaking the REST surface.
///
/// Authenticates with a service-account JWT grant; the resulting OAuth2
/// access token is cached and refreshed shortly before expiry.
#[derive(Clone)]
pub struct FirebaseClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    /// Database root URL without a trailing slash.
    database_url: String,
    token_uri: String,
    client_email: String,
    encoding_key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    /// Unix timestamp (seconds) when this token expires
    expires_at: i64,
}

impl FirebaseClient {
    /// Fails when the configured service-account key is not valid RSA PEM.
    pub fn new(config: &Config) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.firebase_private_key.as_bytes())
            .context("FIREBASE_PRIVATE_KEY is not a valid RSA private key")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                database_url: trim_trailing_slash(&config.firebase_database_url),
                token_uri: config.firebase_token_uri.clone(),
                client_email: config.firebase_client_email.clone(),
                encoding_key,
                token: Mutex::new(None),
            }),
        })
    }

    /// Forces one token fetch so startup fails fast when the store is
    /// unreachable or the credentials are rejected.
    pub async fn connect(&self) -> Result<()> {
        self.access_token().await.map(|_| ())
    }

    /// Returns a valid access token, refreshing it if necessary.
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.inner.token.lock().await;
        let now = chrono::Utc::now().timestamp();

        if let Some(ref cached) = *guard {
            // Refresh 60 s before expiry
            if cached.expires_at > now + 60 {
                return Ok(cached.access_token.clone());
            }
        }

        info!("Fetching new Firebase access token");
        let token = self.fetch_token().await?;
        let expires_at = now + token.expires_in;
        let access_token = token.access_token.clone();

        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });

        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<TokenResponse> {
        let now = chrono::Utc::now().timestamp();
        let claims = assertion_claims(&self.inner.client_email, &self.inner.token_uri, now);
        let assertion = jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.inner.encoding_key,
        )
        .context("Failed to sign service-account assertion")?;

        debug!(token_uri = %self.inner.token_uri, "Requesting OAuth access token");
        let resp = self
            .inner
            .http
            .post(&self.inner.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .context("OAuth token request failed")?
            .error_for_status()
            .context("OAuth token endpoint returned error status")?
            .json::<TokenResponse>()
            .await
            .context("Failed to deserialize OAuth token response")?;

        Ok(resp)
    }

    fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.inner.database_url, path)
    }

    /// Read a database node. A node that was never written reads as JSON
    /// `null`, which callers must handle themselves.
    async fn get_node(&self, path: &str) -> Result<Value> {
        let token = self.access_token().await?;
        let url = self.node_url(path);
        debug!(url = %url, "Reading database node");

        let value = self
            .inner
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("Read of {path} failed"))?
            .error_for_status()
            .with_context(|| format!("Read of {path} returned error status"))?
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to deserialize {path} response"))?;

        Ok(value)
    }

    /// Overwrite a database node.
    async fn put_node<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<()> {
        let token = self.access_token().await?;
        let url = self.node_url(path);
        debug!(url = %url, "Writing database node");

        self.inner
            .http
            .put(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Write of {path} failed"))?
            .error_for_status()
            .with_context(|| format!("Write of {path} returned error status"))?;

        Ok(())
    }
}

#[async_trait]
impl SensorStore for FirebaseClient {
    async fn get_latest(&self) -> Result<Option<StoredReading>> {
        let value = self.get_node(LATEST_PATH).await?;
        if value.is_null() {
            return Ok(None);
        }
        let reading =
            serde_json::from_value(value).context("Latest record has an unexpected shape")?;
        Ok(Some(reading))
    }

    async fn set_latest(&self, reading: &StoredReading) -> Result<()> {
        self.put_node(LATEST_PATH, reading).await
    }

    async fn append_history(&self, reading: &StoredReading) -> Result<String> {
        let token = self.access_token().await?;
        let url = self.node_url(HISTORY_PATH);
        debug!(url = %url, "Appending history entry");

        let resp = self
            .inner
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(reading)
            .send()
            .await
            .context("History append failed")?
            .error_for_status()
            .context("History append returned error status")?
            .json::<PushResponse>()
            .await
            .context("Failed to deserialize history append response")?;

        Ok(resp.name)
    }

    async fn query_last_n(&self, n: usize) -> Result<Vec<HistoryEntry>> {
        let token = self.access_token().await?;
        let url = self.node_url(HISTORY_PATH);
        let limit = n.to_string();
        debug!(url = %url, limit = %limit, "Querying history window");

        let value = self
            .inner
            .http
            .get(&url)
            .bearer_auth(&token)
            // orderBy takes a JSON string, quotes included.
            .query(&[("orderBy", "\"$key\""), ("limitToLast", limit.as_str())])
            .send()
            .await
            .context("History query failed")?
            .error_for_status()
            .context("History query returned error status")?
            .json::<Value>()
            .await
            .context("Failed to deserialize history query response")?;

        if value.is_null() {
            return Ok(Vec::new());
        }

        // Push keys sort lexicographically in creation order, so iterating
        // the map in key order yields the store's insertion sequencing.
        let entries: BTreeMap<String, StoredReading> =
            serde_json::from_value(value).context("History collection has an unexpected shape")?;

        Ok(entries
            .into_iter()
            .map(|(id, reading)| HistoryEntry { id, reading })
            .collect())
    }

    async fn probe(&self) -> Result<Value> {
        let body = json!({
            "test": "connection",
            "timestamp": chrono::Utc::now().timestamp_millis(),
        });
        self.put_node(PROBE_PATH, &body).await?;
        self.get_node(PROBE_PATH).await
    }
}

/// Build the claim set for one token exchange. Pure so tests can pin the
/// issued-at instant.
fn assertion_claims<'a>(client_email: &'a str, token_uri: &'a str, iat: i64) -> Claims<'a> {
    Claims {
        iss: client_email,
        scope: SCOPE,
        aud: token_uri,
        iat,
        exp: iat + 3600,
    }
}

fn trim_trailing_slash(url: &str) -> String {
    url.trim_end_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_EMAIL: &str = "svc@tambak-monitor.iam.gserviceaccount.com";
    const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

    #[test]
    fn trim_trailing_slash_normalizes_url() {
        assert_eq!(
            trim_trailing_slash("https://tambak.firebaseio.com/"),
            "https://tambak.firebaseio.com"
        );
        assert_eq!(
            trim_trailing_slash("https://tambak.firebaseio.com"),
            "https://tambak.firebaseio.com"
        );
    }

    #[test]
    fn assertion_claims_expire_after_one_hour() {
        let claims = assertion_claims(CLIENT_EMAIL, TOKEN_URI, 1_700_000_000);
        assert_eq!(claims.iss, CLIENT_EMAIL);
        assert_eq!(claims.aud, TOKEN_URI);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn assertion_claims_serialize_expected_fields() {
        let claims = assertion_claims(CLIENT_EMAIL, TOKEN_URI, 1_700_000_000);
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["iss"], CLIENT_EMAIL);
        assert_eq!(value["aud"], TOKEN_URI);
        assert_eq!(value["iat"], 1_700_000_000_i64);
        assert_eq!(value["exp"], 1_700_003_600_i64);
        let scope = value["scope"].as_str().unwrap();
        assert!(scope.contains("firebase.database"));
        assert!(scope.contains("userinfo.email"));
    }
}
