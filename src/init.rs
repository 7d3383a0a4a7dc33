use std::sync::Arc;
use log::warn;
use tokio::net::UdpSocket;
use tokio::time::Duration;
use crate::error::Result;
use crate::net_utils::MAX_DATAGRAM;
use crate::read_config::NetworkConfig;

// Pire cas JSON : un identifiant "65535," dans `path` plus 5 chiffres dans `legacy`
const BYTES_PER_HOP: usize = 11;
// Enveloppe d'une réponse (type, capacité, champs fixes)
const RESPONSE_OVERHEAD: usize = 512;
// Clé de route (deux adresses de 15 caractères) et noms de champs d'une entrée d'historique
const HISTORY_ENTRY_OVERHEAD: usize = 128;

pub fn init_logging_and_env() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
}

pub async fn init_socket(port: u16) -> Result<Arc<UdpSocket>> {
    let socket = Arc::new(UdpSocket::bind(format!("0.0.0.0:{}", port)).await?);
    Ok(socket)
}

/// Nombre maximal de sauts proposés par session côté service.
///
/// Borne choisie pour qu'un historique plein de chemins de longueur maximale
/// (sauts acceptés, source et destination) tienne dans un seul datagramme.
pub fn service_hop_limit(max_route_history: usize) -> usize {
    let per_entry = (MAX_DATAGRAM - RESPONSE_OVERHEAD) / max_route_history.max(1);
    (per_entry.saturating_sub(HISTORY_ENTRY_OVERHEAD) / BYTES_PER_HOP)
        .saturating_sub(2)
        .max(1)
}

pub fn init_state(config: &NetworkConfig) -> Result<Arc<crate::AppState>> {
    let limit = service_hop_limit(config.max_route_history);
    let cap = match config.max_manual_hops {
        Some(requested) if requested > limit => {
            warn!("max_manual_hops {} too large for the service, using {}", requested, limit);
            limit
        }
        Some(requested) => requested,
        None => limit,
    };
    let resolver = config.build_resolver()?.with_iteration_cap(Some(cap));
    Ok(Arc::new(crate::AppState::new(
        resolver,
        Duration::from_secs(config.session_timeout_secs),
    )))
}
