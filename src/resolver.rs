// Orchestration d'une requête de routage : annuaire, historique puis session manuelle

use std::sync::Arc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use crate::directory::RouterDirectory;
use crate::error::RouteError;
use crate::hop_source::HopSource;
use crate::net_utils::validate_ip;
use crate::path_builder::{self, BuilderState, PathBuilder};
use crate::route_cache::RouteCache;
use crate::topology::AdjacencyTopology;
use crate::types::{Endpoint, Path, RouteKey, RouterId};

/// Sort de l'historique pour une requête résolue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStatus {
    /// Chemin retrouvé dans l'historique
    Hit,
    /// Nouveau chemin enregistré
    Stored,
    /// Historique plein : chemin rendu mais non enregistré
    Full,
    /// Une autre session a enregistré cette clé entre-temps ; elle fait foi
    AlreadyCached,
    /// Source et destination sur le même routeur, historique non consulté
    Bypassed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub key: RouteKey,
    pub source_router: RouterId,
    pub destination_router: RouterId,
    pub path: Path,
    pub cache: CacheStatus,
}

/// Requête absente de l'historique, en attente de construction du chemin
#[derive(Debug, Clone)]
pub struct PendingRoute {
    pub key: RouteKey,
    pub source_router: RouterId,
    pub destination_router: RouterId,
    pub builder: PathBuilder,
}

#[derive(Debug, Clone)]
pub enum Lookup {
    Resolved(Resolution),
    Pending(PendingRoute),
}

pub struct RouteResolver {
    topology: Arc<AdjacencyTopology>,
    directory: RouterDirectory,
    cache: RouteCache,
    max_manual_hops: Option<usize>,
}

impl RouteResolver {
    pub fn new(topology: Arc<AdjacencyTopology>, directory: RouterDirectory, cache: RouteCache) -> Self {
        Self {
            topology,
            directory,
            cache,
            max_manual_hops: None,
        }
    }

    /// Limite appliquée à chaque session manuelle créée par ce résolveur
    pub fn with_iteration_cap(mut self, max_manual_hops: Option<usize>) -> Self {
        self.max_manual_hops = max_manual_hops;
        self
    }

    pub fn topology(&self) -> &Arc<AdjacencyTopology> {
        &self.topology
    }

    pub fn directory(&self) -> &RouterDirectory {
        &self.directory
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Valide la syntaxe des deux adresses puis trouve leurs routeurs
    pub fn locate(&self, source: &str, destination: &str) -> Result<(RouterId, RouterId), RouteError> {
        for address in [source, destination] {
            if !validate_ip(address) {
                return Err(RouteError::InvalidAddressFormat(address.to_string()));
            }
        }
        let source_router = self.locate_one(source, Endpoint::Source)?;
        let destination_router = self.locate_one(destination, Endpoint::Destination)?;
        Ok((source_router, destination_router))
    }

    pub fn locate_one(&self, address: &str, which: Endpoint) -> Result<RouterId, RouteError> {
        if !validate_ip(address) {
            return Err(RouteError::InvalidAddressFormat(address.to_string()));
        }
        self.directory
            .resolve(address)
            .ok_or(RouteError::AddressNotFound(which))
    }

    /// Première moitié d'une requête : résolution des extrémités et consultation de l'historique.
    ///
    /// Sans correspondance, renvoie une session prête à être pilotée puis confiée à `commit`.
    pub fn begin(&self, source: &str, destination: &str) -> Result<Lookup, RouteError> {
        let (source_router, destination_router) = self.locate(source, destination)?;
        let key = RouteKey::new(source, destination);

        if source_router == destination_router {
            debug!("{} and {} share {}, history bypassed", source, destination, source_router);
            return Ok(Lookup::Resolved(Resolution {
                key,
                source_router,
                destination_router,
                path: Path::single(source_router),
                cache: CacheStatus::Bypassed,
            }));
        }

        if let Some(path) = self.cache.lookup(&key) {
            debug!("History hit for {}: {}", key, path);
            return Ok(Lookup::Resolved(Resolution {
                key,
                source_router,
                destination_router,
                path: path.clone(),
                cache: CacheStatus::Hit,
            }));
        }

        let mut builder = PathBuilder::new(Arc::clone(&self.topology), source_router, destination_router)?;
        if let Some(limit) = self.max_manual_hops {
            builder = builder.with_iteration_cap(limit);
        }
        builder.start();

        Ok(Lookup::Pending(PendingRoute {
            key,
            source_router,
            destination_router,
            builder,
        }))
    }

    /// Seconde moitié : enregistre le chemin d'une session finalisée.
    ///
    /// Un historique plein n'empêche pas de rendre le chemin.
    pub fn commit(&mut self, pending: PendingRoute) -> Result<Resolution, RouteError> {
        let path = match (pending.builder.state(), pending.builder.path()) {
            (BuilderState::Finalized, Some(path)) => path.clone(),
            (state, _) => {
                return Err(RouteError::InvalidTransition {
                    state: state.name(),
                    action: "commit the route",
                })
            }
        };

        let cache = match self.cache.insert(pending.key.clone(), path.clone()) {
            Ok(()) => {
                info!("New route logged for {}: {}", pending.key, path);
                CacheStatus::Stored
            }
            Err(RouteError::CacheFull { capacity }) => {
                warn!("Route history full ({} entries), {} not stored", capacity, pending.key);
                CacheStatus::Full
            }
            Err(RouteError::DuplicateRouteKey) => {
                debug!("Route {} committed by another session first", pending.key);
                CacheStatus::AlreadyCached
            }
            Err(err) => return Err(err),
        };

        Ok(Resolution {
            key: pending.key,
            source_router: pending.source_router,
            destination_router: pending.destination_router,
            path,
            cache,
        })
    }

    /// Résout une requête de bout en bout, en pilotant la session avec `hops` si besoin
    pub fn resolve<S: HopSource + ?Sized>(
        &mut self,
        source: &str,
        destination: &str,
        hops: &mut S,
    ) -> Result<Resolution, RouteError> {
        match self.begin(source, destination)? {
            Lookup::Resolved(resolution) => Ok(resolution),
            Lookup::Pending(mut pending) => {
                if let Err(err) = path_builder::drive(&mut pending.builder, hops) {
                    warn!("Routing session for {} ended without a path: {}", pending.key, err);
                    return Err(err);
                }
                self.commit(pending)
            }
        }
    }
}
