#![allow(dead_code)]

use std::sync::{atomic::{AtomicUsize, Ordering}, Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use step_sync::authtoken::{AuthTokenCache, Credentials};
use step_sync::client::RemoteStepsClient;
use step_sync::error::SyncError;
use step_sync::source::{GrantState, StepSource};
use step_sync::store::MemoryStore;
use step_sync::types::SharedStore;

pub const TEST_USER: &str = "user1@test.com";

pub fn credentials() -> Credentials {
    Credentials { identifier: TEST_USER.to_string(), password: "Test123!".to_string() }
}

pub fn memory_store() -> SharedStore {
    Arc::new(MemoryStore::new())
}

pub fn token_cache(base_url: &str, store: SharedStore) -> AuthTokenCache {
    AuthTokenCache::new(reqwest::Client::new(), base_url, credentials(), store)
}

pub fn remote_client(base_url: &str, store: SharedStore) -> RemoteStepsClient {
    RemoteStepsClient::new(reqwest::Client::new(), base_url, TEST_USER.to_string(), token_cache(base_url, store))
}

/// In-memory step source with a scripted answer.
pub struct FakeSource {
    pub available: bool,
    pub grant: Mutex<GrantState>,
    pub steps: Result<Vec<u32>, SyncError>,
    pub prompts: AtomicUsize,
    pub reads: AtomicUsize,
}

impl FakeSource {
    pub fn with_steps(steps: Vec<u32>) -> FakeSource {
        FakeSource {
            available: true,
            grant: Mutex::new(GrantState::Authorized),
            steps: Ok(steps),
            prompts: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> FakeSource {
        FakeSource { available: false, grant: Mutex::new(GrantState::NotDetermined), ..FakeSource::with_steps(Vec::new()) }
    }

    pub fn undetermined(steps: Vec<u32>) -> FakeSource {
        FakeSource { grant: Mutex::new(GrantState::NotDetermined), ..FakeSource::with_steps(steps) }
    }

    pub fn failing() -> FakeSource {
        FakeSource { steps: Err(SyncError::StepSource("query returned no result".into())), ..FakeSource::with_steps(Vec::new()) }
    }
}

#[async_trait]
impl StepSource for FakeSource {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn authorization_status(&self) -> GrantState {
        *self.grant.lock().unwrap()
    }

    async fn request_permission(&self) -> Result<GrantState, SyncError> {
        let mut grant = self.grant.lock().unwrap();
        if *grant == GrantState::NotDetermined {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            *grant = GrantState::Authorized;
        }
        Ok(*grant)
    }

    async fn hourly_steps(&self, _start_of_day: DateTime<Utc>, _now: DateTime<Utc>) -> Result<Vec<u32>, SyncError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.steps.clone()
    }
}
