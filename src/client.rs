use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};
use chrono::Utc;

use crate::authtoken::AuthTokenCache;
use crate::error::SyncError;
use crate::models::{DailyStepsResult, StepsUploadRecord};

/// Client for the remote steps API.
pub struct RemoteStepsClient {
    http: Client,
    steps_url: String,
    username: String,
    auth_token: AuthTokenCache,
}

impl RemoteStepsClient {
    pub fn new(http: Client, base_url: &str, username: String, auth_token: AuthTokenCache) -> RemoteStepsClient {
        RemoteStepsClient {
            http,
            steps_url: format!("{}/steps", base_url.trim_end_matches('/')),
            username,
            auth_token,
        }
    }

    pub async fn fetch_auth_token(&self) -> Result<String, SyncError> {
        self.auth_token.get_token().await
    }

    /// The latest `n` day-aggregates, oldest first.
    pub async fn fetch_last_n_days(&self, n: u32) -> Result<Vec<DailyStepsResult>, SyncError> {
        let token = self.fetch_auth_token().await?;

        let res = self.http.get(&self.steps_url)
            .query(&[("_limit", n)])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| SyncError::Fetch(e.to_string()))?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            error!("Error fetching steps: status={}, {}", status, body);
            return Err(SyncError::Fetch(format!("HTTP {status} - {body}")));
        }

        let mut steps: Vec<DailyStepsResult> = res.json().await.map_err(|e| SyncError::Fetch(e.to_string()))?;
        // the API's ordering is not guaranteed
        steps.sort_by_key(|day| day.datetime);
        debug!("Fetched {} day-aggregates", steps.len());
        Ok(steps)
    }

    /// Best-effort: a non-200 response is logged and dropped.
    pub async fn upload_total(&self, count: u32) -> Result<(), SyncError> {
        let token = self.fetch_auth_token().await?;
        let record = StepsUploadRecord::new(&self.username, Utc::now(), count);

        let res = self.http.post(&self.steps_url)
            .bearer_auth(&token)
            .json(&record)
            .send()
            .await
            .map_err(|e| SyncError::Upload(e.to_string()))?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            warn!("Error uploading steps: status={}, {}", status, body);
            return Ok(());
        }
        info!("Uploaded {} steps for {}", count, record.date);
        Ok(())
    }
}
