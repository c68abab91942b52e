use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use log::{info, warn};

use crate::client::RemoteStepsClient;
use crate::error::SyncError;
use crate::models::DailyStepsResult;
use crate::source::{GrantState, StepSource};

/// Authorize / fetch / upload workflow the view model drives.
#[async_trait]
pub trait StepsService: Send + Sync {
    async fn is_authorized(&self) -> bool;
    async fn request_authorization(&self) -> Result<(), SyncError>;
    async fn fetch_steps_by_hour(&self) -> Result<Vec<u32>, SyncError>;
    async fn fetch_steps_by_day(&self) -> Result<Vec<DailyStepsResult>, SyncError>;
}

pub struct StepsSyncService {
    source: Arc<dyn StepSource>,
    client: RemoteStepsClient,
    history_days: u32,
}

impl StepsSyncService {
    pub fn new(source: Arc<dyn StepSource>, client: RemoteStepsClient, history_days: u32) -> StepsSyncService {
        StepsSyncService { source, client, history_days }
    }

    async fn upload_best_effort(&self, total: u64) {
        let count = u32::try_from(total).unwrap_or(u32::MAX);
        if let Err(e) = self.client.upload_total(count).await {
            warn!("steps_sync:: upload of {count} steps dropped: {e}");
        }
    }
}

/// Local midnight of the day containing `now`, in UTC.
pub fn start_of_local_day(now: DateTime<Local>) -> Result<DateTime<Utc>, SyncError> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .ok_or_else(|| SyncError::StepSource(format!("no local midnight for {now}")))
}

#[async_trait]
impl StepsService for StepsSyncService {
    async fn is_authorized(&self) -> bool {
        self.source.authorization_status().await.is_determined()
    }

    async fn request_authorization(&self) -> Result<(), SyncError> {
        if !self.source.is_available().await {
            return Err(SyncError::HealthDataUnavailable);
        }
        if self.source.authorization_status().await == GrantState::NotDetermined {
            let grant = self.source.request_permission().await?;
            info!("steps_sync:: permission prompt answered: {:?}", grant);
        }
        Ok(())
    }

    async fn fetch_steps_by_hour(&self) -> Result<Vec<u32>, SyncError> {
        let now = Local::now();
        let start_of_day = start_of_local_day(now)?;
        let steps = self.source.hourly_steps(start_of_day, now.with_timezone(&Utc)).await?;

        self.upload_best_effort(steps.iter().map(|&s| u64::from(s)).sum()).await;
        Ok(steps)
    }

    async fn fetch_steps_by_day(&self) -> Result<Vec<DailyStepsResult>, SyncError> {
        self.client.fetch_last_n_days(self.history_days).await
    }
}
