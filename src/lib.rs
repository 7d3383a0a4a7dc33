// Simulation de routage sur un petit réseau statique : annuaire des adresses,
// historique des routes et construction interactive des chemins.

pub mod types;
pub mod error;
pub mod topology;
pub mod directory;
pub mod route_cache;
pub mod path_builder;
pub mod hop_source;
pub mod resolver;
pub mod net_utils;
pub mod read_config;
pub mod init;
pub mod tasks;
pub mod protocol;
pub mod server;
pub mod client;
pub mod console;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

pub use error::{AppError, RouteError};
pub use resolver::{CacheStatus, Lookup, PendingRoute, Resolution, RouteResolver};
pub use types::{Endpoint, Path, RouteKey, RouterId};

/// Session manuelle en cours côté service
#[derive(Debug)]
pub struct SessionEntry {
    pub pending: PendingRoute,
    pub client: SocketAddr,
    pub last_activity: Instant,
}

/// État global du service de routage
pub struct AppState {
    pub resolver: Mutex<RouteResolver>,
    pub sessions: Mutex<HashMap<u64, SessionEntry>>,
    pub session_timeout: Duration,
    next_session: AtomicU64,
}

impl AppState {
    pub fn new(resolver: RouteResolver, session_timeout: Duration) -> Self {
        Self {
            resolver: Mutex::new(resolver),
            sessions: Mutex::new(HashMap::new()),
            session_timeout,
            next_session: AtomicU64::new(1),
        }
    }

    pub fn next_session_id(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
