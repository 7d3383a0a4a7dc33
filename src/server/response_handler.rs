// Traitement des requêtes du service : une requête en entrée, une réponse en sortie

use std::net::SocketAddr;
use std::sync::Arc;
use log::{debug, info, warn};
use tokio::time::Instant;
use crate::error::RouteError;
use crate::path_builder::{BuilderState, HopOutcome};
use crate::protocol::message_types::{HistoryEntry, Request, Response};
use crate::resolver::{Lookup, PendingRoute};
use crate::{AppState, SessionEntry};

pub async fn handle_request(state: &Arc<AppState>, request: Request, client: SocketAddr) -> Response {
    match request {
        Request::Query { source, destination } => handle_query(state, &source, &destination, client).await,
        Request::ChooseDirect { session } => handle_choose_direct(state, session, client).await,
        Request::ChooseManual { session } => handle_choose_manual(state, session, client).await,
        Request::ProposeHop { session, hop } => handle_propose_hop(state, session, hop, client).await,
        Request::Abandon { session } => match take_session(state, session, client).await {
            Ok(entry) => {
                info!("Routing session {} for {} abandoned by {}", session, entry.pending.key, client);
                Response::Abandoned {
                    session,
                    reason: RouteError::SessionAbandoned.to_string(),
                }
            }
            Err(err) => Response::rejected(Some(session), &err),
        },
        Request::Topology => {
            let resolver = state.resolver.lock().await;
            Response::Topology {
                matrix: resolver.topology().to_matrix(),
                rendered: resolver.topology().render(),
            }
        }
        Request::History => {
            let resolver = state.resolver.lock().await;
            let cache = resolver.cache();
            Response::History {
                entries: cache
                    .entries()
                    .map(|(key, path)| HistoryEntry {
                        key: key.clone(),
                        path: path.clone(),
                        legacy: path.legacy_digits(),
                    })
                    .collect(),
                capacity: cache.capacity(),
            }
        }
    }
}

async fn handle_query(state: &Arc<AppState>, source: &str, destination: &str, client: SocketAddr) -> Response {
    let lookup = {
        let resolver = state.resolver.lock().await;
        resolver.begin(source, destination)
    };

    match lookup {
        Ok(Lookup::Resolved(resolution)) => {
            debug!("Query {} answered without a session ({:?})", resolution.key, resolution.cache);
            Response::resolved(resolution)
        }
        Ok(Lookup::Pending(pending)) => {
            let session = state.next_session_id();
            info!("Routing session {} opened for {} by {}", session, pending.key, client);
            let response = session_prompt(session, &pending);
            state.sessions.lock().await.insert(
                session,
                SessionEntry {
                    pending,
                    client,
                    last_activity: Instant::now(),
                },
            );
            response
        }
        Err(err) => Response::rejected(None, &err),
    }
}

async fn handle_choose_direct(state: &Arc<AppState>, session: u64, client: SocketAddr) -> Response {
    let mut entry = match take_session(state, session, client).await {
        Ok(entry) => entry,
        Err(err) => return Response::rejected(Some(session), &err),
    };

    match entry.pending.builder.choose_direct() {
        Ok(_) => commit(state, session, entry.pending).await,
        Err(err) => {
            restore_session(state, session, entry).await;
            Response::rejected(Some(session), &err)
        }
    }
}

async fn handle_choose_manual(state: &Arc<AppState>, session: u64, client: SocketAddr) -> Response {
    let mut entry = match take_session(state, session, client).await {
        Ok(entry) => entry,
        Err(err) => return Response::rejected(Some(session), &err),
    };

    let response = match entry.pending.builder.choose_manual() {
        Ok(()) => session_prompt(session, &entry.pending),
        Err(err) => Response::rejected(Some(session), &err),
    };
    restore_session(state, session, entry).await;
    response
}

async fn handle_propose_hop(state: &Arc<AppState>, session: u64, hop: i64, client: SocketAddr) -> Response {
    let mut entry = match take_session(state, session, client).await {
        Ok(entry) => entry,
        Err(err) => return Response::rejected(Some(session), &err),
    };

    match entry.pending.builder.propose_hop(hop) {
        Ok(HopOutcome::Finalized(_)) => commit(state, session, entry.pending).await,
        Ok(HopOutcome::Advanced { .. }) => {
            let response = session_prompt(session, &entry.pending);
            restore_session(state, session, entry).await;
            response
        }
        Err(err) if err.is_hop_rejection() => {
            restore_session(state, session, entry).await;
            Response::rejected(Some(session), &err)
        }
        Err(err) if entry.pending.builder.state() == BuilderState::Abandoned => {
            warn!("Routing session {} for {} dropped: {}", session, entry.pending.key, err);
            Response::Abandoned {
                session,
                reason: err.to_string(),
            }
        }
        Err(err) => {
            restore_session(state, session, entry).await;
            Response::rejected(Some(session), &err)
        }
    }
}

async fn commit(state: &Arc<AppState>, session: u64, pending: PendingRoute) -> Response {
    let mut resolver = state.resolver.lock().await;
    match resolver.commit(pending) {
        Ok(resolution) => {
            info!("Routing session {} finalized: {}", session, resolution.path);
            Response::resolved(resolution)
        }
        Err(err) => Response::rejected(Some(session), &err),
    }
}

/// Réponse décrivant ce que la session attend maintenant
fn session_prompt(session: u64, pending: &PendingRoute) -> Response {
    let builder = &pending.builder;
    match builder.state() {
        BuilderState::OfferDirect => Response::OfferDirect {
            session,
            source_router: builder.source(),
            destination_router: builder.destination(),
        },
        _ => Response::AwaitingHop {
            session,
            current: builder.current(),
            destination: builder.destination(),
            path_so_far: builder.path_so_far().to_vec(),
            destination_reachable: builder.destination_reachable(),
        },
    }
}

/// Retire la session de la table ; seul le client qui l'a ouverte peut la piloter
async fn take_session(state: &Arc<AppState>, session: u64, client: SocketAddr) -> Result<SessionEntry, RouteError> {
    let mut sessions = state.sessions.lock().await;
    match sessions.get(&session) {
        Some(entry) if entry.client == client => {}
        _ => return Err(RouteError::UnknownSession(session)),
    }
    sessions.remove(&session).ok_or(RouteError::UnknownSession(session))
}

async fn restore_session(state: &Arc<AppState>, session: u64, mut entry: SessionEntry) {
    entry.last_activity = Instant::now();
    state.sessions.lock().await.insert(session, entry);
}

/// Supprime les sessions inactives depuis plus que le délai configuré ; leur chemin partiel est perdu
pub async fn expire_sessions(state: &Arc<AppState>) -> usize {
    let now = Instant::now();
    let mut sessions = state.sessions.lock().await;
    let before = sessions.len();
    sessions.retain(|id, entry| {
        let alive = now.duration_since(entry.last_activity) <= state.session_timeout;
        if !alive {
            warn!(
                "Routing session {} for {} expired, partial path {:?} discarded",
                id,
                entry.pending.key,
                entry.pending.builder.path_so_far()
            );
        }
        alive
    });
    before - sessions.len()
}
