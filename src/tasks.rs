use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use crate::server::response_handler::expire_sessions;

/// Purge périodiquement les sessions manuelles inactives
pub fn spawn_session_timeout_task(state: Arc<crate::AppState>) -> JoinHandle<()> {
    let state_clone = Arc::clone(&state);
    tokio::spawn(async move {
        let period = (state_clone.session_timeout / 2).max(Duration::from_millis(100));
        let mut interval = time::interval(period);
        loop {
            interval.tick().await;
            let expired = expire_sessions(&state_clone).await;
            if expired > 0 {
                log::debug!("{} routing session(s) expired", expired);
            }
        }
    })
}
