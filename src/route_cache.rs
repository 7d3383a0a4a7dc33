// Historique des routes déjà calculées

use std::collections::HashMap;
use crate::error::RouteError;
use crate::types::{Path, RouteKey};

/// Capacité de l'historique des routes
pub const MAX_ROUTE_HISTORY: usize = 20;

/// Cache (source, destination) -> chemin, en ajout seul.
///
/// Une clé présente n'est jamais modifiée ni retirée. Une fois la capacité
/// atteinte, plus aucune clé n'est acceptée : il n'y a pas d'éviction.
#[derive(Debug, Clone)]
pub struct RouteCache {
    capacity: usize,
    routes: HashMap<RouteKey, Path>,
    order: Vec<RouteKey>,
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new(MAX_ROUTE_HISTORY)
    }
}

impl RouteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            routes: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    pub fn lookup(&self, key: &RouteKey) -> Option<&Path> {
        self.routes.get(key)
    }

    pub fn contains(&self, key: &RouteKey) -> bool {
        self.routes.contains_key(key)
    }

    /// Enregistre un chemin pour une nouvelle clé.
    ///
    /// Une clé déjà présente est refusée avec `DuplicateRouteKey` sans toucher
    /// au chemin existant.
    pub fn insert(&mut self, key: RouteKey, path: Path) -> Result<(), RouteError> {
        if self.routes.contains_key(&key) {
            return Err(RouteError::DuplicateRouteKey);
        }
        if self.routes.len() >= self.capacity {
            return Err(RouteError::CacheFull { capacity: self.capacity });
        }
        self.order.push(key.clone());
        self.routes.insert(key, path);
        Ok(())
    }

    /// Entrées dans l'ordre d'enregistrement
    pub fn entries(&self) -> impl Iterator<Item = (&RouteKey, &Path)> {
        self.order
            .iter()
            .filter_map(move |key| self.routes.get(key).map(|path| (key, path)))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.routes.len() >= self.capacity
    }
}
