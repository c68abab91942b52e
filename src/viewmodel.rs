use std::{future::Future, sync::Arc};
use log::{debug, error, info, warn};
use tokio::sync::RwLock;

use crate::error::{Severity, SyncError};
use crate::models::SyncState;
use crate::service::StepsService;

/// Observable sync state plus the operations that update it.
///
/// Operations do not hold the state lock while the service call is in flight, so two
/// overlapping refreshes both complete and the last one to finish wins.
pub struct SyncViewModel {
    service: Arc<dyn StepsService>,
    state: RwLock<SyncState>,
}

impl SyncViewModel {
    pub fn new(service: Arc<dyn StepsService>) -> SyncViewModel {
        SyncViewModel { service, state: RwLock::new(SyncState::default()) }
    }

    pub async fn state(&self) -> SyncState {
        self.state.read().await.clone()
    }

    pub async fn is_authorized(&self) -> bool {
        self.service.is_authorized().await
    }

    /// First display: authorize if needed, then load today's hours.
    pub async fn on_appear(&self) {
        if self.is_authorized().await {
            self.state.write().await.is_authorized = true;
        } else {
            self.request_authorization().await;
        }
        if self.state.read().await.fatal_error.is_some() {
            info!("view_model:: skipping hourly fetch after fatal error");
            return;
        }
        self.refresh_hourly().await;
    }

    pub async fn request_authorization(&self) {
        if !self.begin("request_authorization").await {
            return;
        }
        let result = self.call("request_authorization", |service| async move {
            service.request_authorization().await
        }).await;
        let authorized = self.service.is_authorized().await;

        let mut state = self.state.write().await;
        state.is_authorized = authorized;
        if let Err(e) = result {
            Self::handle_error(&mut state, e);
        }
    }

    pub async fn refresh_hourly(&self) {
        if !self.begin("refresh_hourly").await {
            return;
        }
        let result = self.call("refresh_hourly", |service| async move {
            service.fetch_steps_by_hour().await
        }).await;

        let mut state = self.state.write().await;
        match result {
            Ok(steps) => {
                state.steps_by_hour = steps;
                debug!("view_model:: {} steps today over {} hours", state.steps_today(), state.steps_by_hour.len());
            }
            Err(e) => Self::handle_error(&mut state, e),
        }
    }

    pub async fn refresh_history(&self) {
        if !self.begin("refresh_history").await {
            return;
        }
        let result = self.call("refresh_history", |service| async move {
            service.fetch_steps_by_day().await
        }).await;

        let mut state = self.state.write().await;
        match result {
            Ok(days) => state.steps_by_day = days,
            Err(e) => Self::handle_error(&mut state, e),
        }
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.error = None;
    }

    /// Clears the non-fatal slot. Returns false when a fatal error already ended the session.
    async fn begin(&self, operation: &str) -> bool {
        let mut state = self.state.write().await;
        if let Some(fatal) = &state.fatal_error {
            debug!("view_model:: {operation} ignored, fatal error present: {fatal}");
            return false;
        }
        state.error = None;
        true
    }

    /// Runs one service call on its own task. A panic in the service surfaces as `Unknown`
    /// instead of taking down the caller (a request handler or the refresh timer).
    async fn call<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, SyncError>
    where
        F: FnOnce(Arc<dyn StepsService>) -> Fut,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::spawn(f(self.service.clone())).await {
            Ok(result) => result,
            Err(e) => Err(SyncError::Unknown(format!("{operation}: {e}"))),
        }
    }

    fn handle_error(state: &mut SyncState, e: SyncError) {
        match e.severity() {
            Severity::Fatal => {
                error!("view_model:: fatal: {e}");
                state.fatal_error = Some(e);
            }
            Severity::NonFatal => {
                warn!("view_model:: {e}");
                state.error = Some(e);
            }
        }
    }
}
