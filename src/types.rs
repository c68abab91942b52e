use std::sync::Arc;

use crate::store::KeyValueStore;
use crate::viewmodel::SyncViewModel;

/// Shared between the HTTP handlers and the refresh timer.
pub type SharedViewModel = Arc<SyncViewModel>;

pub type SharedStore = Arc<dyn KeyValueStore>;
