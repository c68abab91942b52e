use log::{debug, info};
use tokio::{sync::mpsc, task::JoinHandle, time::Duration};

use crate::types::SharedViewModel;

/// Re-runs the hourly fetch every `period` until stopped.
pub struct RefreshTimer {
    cancel: mpsc::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    pub fn start(view_model: SharedViewModel, period: Duration) -> RefreshTimer {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(refresh_loop(view_model, period, rx));
        info!("refresh_timer:: started, period {:?}", period);
        RefreshTimer { cancel: tx, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signals the loop and waits for it to exit. A tick already in flight completes first.
    pub async fn stop(self) {
        self.cancel.send(true).await.ok();
        if !self.handle.is_finished() {
            self.handle.await.ok();
        }
        info!("refresh_timer:: stopped");
    }

    /// Resolves when the loop exits on its own, which only happens if it panics.
    pub async fn join(&mut self) {
        (&mut self.handle).await.ok();
    }
}

async fn refresh_loop(view_model: SharedViewModel, period: Duration, mut rx: mpsc::Receiver<bool>) {
    loop {
        let sleep_handle = tokio::time::sleep(period);
        let cancel_handle = rx.recv();

        tokio::select! {
            _ = sleep_handle => {}
            _ = cancel_handle => {
                debug!("refresh_timer:: canceled");
                break;
            }
        }

        debug!("refresh_timer:: tick");
        view_model.refresh_hourly().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{atomic::Ordering, Arc};

    use crate::service::mock::MockStepsService;
    use crate::viewmodel::SyncViewModel;

    #[tokio::test(start_paused = true)]
    async fn ticks_every_period_until_stopped() {
        let mock = Arc::new(MockStepsService::authorized());
        mock.set_steps_by_hour(Ok(vec![5, 5]));
        let view_model = Arc::new(SyncViewModel::new(mock.clone()));

        let timer = RefreshTimer::start(view_model.clone(), Duration::from_secs(300));
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(mock.hour_calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(302)).await;
        assert_eq!(mock.hour_calls.load(Ordering::SeqCst), 2);
        assert_eq!(view_model.state().await.steps_today(), 10);

        timer.stop().await;
        tokio::time::sleep(Duration::from_secs(3000)).await;
        assert_eq!(mock.hour_calls.load(Ordering::SeqCst), 2);
    }
}
