// Bearer token for the steps API. Fetched from `POST /auth/local` on first use and
// kept in the key-value store indefinitely: there is no expiry or refresh path.

use log::{info, warn};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::models::{AuthRequest, AuthResponse};
use crate::store::KeyValueStore;
use crate::types::SharedStore;
use crate::util::get_short_token;

pub const AUTH_TOKEN_KEY: &str = "authToken";

#[derive(Clone, Debug)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

pub struct AuthTokenCache {
    http: Client,
    auth_url: String,
    credentials: Credentials,
    store: SharedStore,
    // held across the read-then-fetch-then-write sequence
    lock: Mutex<()>,
}

impl AuthTokenCache {
    pub fn new(http: Client, base_url: &str, credentials: Credentials, store: SharedStore) -> AuthTokenCache {
        AuthTokenCache {
            http,
            auth_url: format!("{}/auth/local", base_url.trim_end_matches('/')),
            credentials,
            store,
            lock: Mutex::new(()),
        }
    }

    pub async fn get_token(&self) -> Result<String, SyncError> {
        let _guard = self.lock.lock().await;

        match self.store.get(AUTH_TOKEN_KEY).await {
            Ok(Some(token)) => return Ok(token),
            Ok(None) => {}
            Err(e) => warn!("auth_token:: could not read cached token, fetching a new one: {e}"),
        }

        let token = self.fetch_token().await?;
        if let Err(e) = self.store.set(AUTH_TOKEN_KEY, &token).await {
            warn!("auth_token:: could not persist token: {e}");
        }
        info!("auth_token:: fetched new token ...{}", get_short_token(&token));
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<String, SyncError> {
        let body = AuthRequest {
            identifier: self.credentials.identifier.clone(),
            password: self.credentials.password.clone(),
        };

        let res = self.http.post(&self.auth_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Auth(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SyncError::Auth(format!("HTTP {status} - {body}")));
        }

        let response: AuthResponse = res.json().await.map_err(|e| SyncError::Auth(e.to_string()))?;
        Ok(response.jwt)
    }
}
