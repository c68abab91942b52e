use std::path::PathBuf;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::SyncError;

/// Whether the user has answered the step-data permission prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantState {
    NotDetermined,
    Denied,
    Authorized,
}

impl GrantState {
    /// Denied counts as determined; nothing downstream tells the two apart.
    pub fn is_determined(&self) -> bool {
        *self != GrantState::NotDetermined
    }
}

/// Local step-count subsystem.
#[async_trait]
pub trait StepSource: Send + Sync {
    async fn is_available(&self) -> bool;

    async fn authorization_status(&self) -> GrantState;

    /// Prompts once. Returns the current state without prompting when already determined.
    async fn request_permission(&self) -> Result<GrantState, SyncError>;

    /// Per-hour totals from `start_of_day` up to the hour containing `now`.
    async fn hourly_steps(&self, start_of_day: DateTime<Utc>, now: DateTime<Utc>) -> Result<Vec<u32>, SyncError>;
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct StepSample {
    pub timestamp: DateTime<Utc>,
    pub count: u32,
}

/// Cumulative sum of `samples` in one-hour buckets anchored at `start_of_day`.
pub fn bucket_hourly(samples: &[StepSample], start_of_day: DateTime<Utc>, now: DateTime<Utc>) -> Vec<u32> {
    if now < start_of_day {
        return Vec::new();
    }
    let elapsed_hours = (now - start_of_day).num_hours();
    let mut buckets = vec![0u32; elapsed_hours as usize + 1];

    for sample in samples {
        if sample.timestamp < start_of_day || sample.timestamp > now {
            continue;
        }
        let index = (sample.timestamp - start_of_day).num_hours() as usize;
        if let Some(bucket) = buckets.get_mut(index) {
            *bucket = bucket.saturating_add(sample.count);
        }
    }
    buckets
}

/// Reads step samples exported to a JSON file:
/// `[{ "timestamp": "2025-01-13T08:15:00Z", "count": 120 }, ...]`.
pub struct SampleFileSource {
    path: PathBuf,
    grant: RwLock<GrantState>,
}

impl SampleFileSource {
    pub fn new(path: impl Into<PathBuf>) -> SampleFileSource {
        SampleFileSource { path: path.into(), grant: RwLock::new(GrantState::NotDetermined) }
    }

    async fn read_samples(&self) -> Result<Vec<StepSample>, SyncError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SyncError::StepSource(format!("{}: {e}", self.path.display())))?;
        serde_json::from_slice(&bytes).map_err(|e| SyncError::StepSource(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl StepSource for SampleFileSource {
    async fn is_available(&self) -> bool {
        tokio::fs::metadata(&self.path).await.map(|m| m.is_file()).unwrap_or(false)
    }

    async fn authorization_status(&self) -> GrantState {
        *self.grant.read().await
    }

    async fn request_permission(&self) -> Result<GrantState, SyncError> {
        let mut grant = self.grant.write().await;
        if *grant == GrantState::NotDetermined {
            // Pointing the service at the file is the user's consent.
            *grant = GrantState::Authorized;
            info!("step_source:: read access granted for {}", self.path.display());
        }
        Ok(*grant)
    }

    async fn hourly_steps(&self, start_of_day: DateTime<Utc>, now: DateTime<Utc>) -> Result<Vec<u32>, SyncError> {
        let samples = self.read_samples().await?;
        let buckets = bucket_hourly(&samples, start_of_day, now);
        debug!("step_source:: {} samples -> {} hourly buckets", samples.len(), buckets.len());
        Ok(buckets)
    }
}
