// Annuaire adresse -> routeur propriétaire

use std::collections::HashMap;
use log::debug;
use crate::error::{AppError, Result, RouteError};
use crate::net_utils::validate_ip;
use crate::types::RouterId;

/// Associe chaque adresse configurée au routeur qui la porte.
///
/// Construit une seule fois au démarrage, en lecture seule ensuite.
#[derive(Debug, Clone, Default)]
pub struct RouterDirectory {
    owners: HashMap<String, RouterId>,
    networks: Vec<Vec<String>>,
}

impl RouterDirectory {
    /// Construit l'annuaire depuis la liste ordonnée des adresses de chaque routeur.
    ///
    /// `assignments[i]` contient les adresses du routeur `i + 1`. Une adresse
    /// attribuée deux fois est refusée avec `DuplicateAddressAssignment`.
    pub fn build(assignments: &[Vec<String>], max_networks_per_router: usize) -> Result<Self> {
        let mut owners: HashMap<String, RouterId> = HashMap::new();

        for (i, addresses) in assignments.iter().enumerate() {
            let router = RouterId((i + 1) as u16);
            if addresses.len() > max_networks_per_router {
                return Err(AppError::ConfigError(format!(
                    "{} has {} networks, at most {} allowed",
                    router,
                    addresses.len(),
                    max_networks_per_router
                )));
            }
            for address in addresses {
                if !validate_ip(address) {
                    return Err(RouteError::InvalidAddressFormat(address.clone()).into());
                }
                if let Some(first) = owners.get(address) {
                    return Err(RouteError::DuplicateAddressAssignment {
                        address: address.clone(),
                        first: *first,
                        second: router,
                    }
                    .into());
                }
                owners.insert(address.clone(), router);
            }
        }

        debug!("Router directory built with {} addresses", owners.len());
        Ok(Self {
            owners,
            networks: assignments.to_vec(),
        })
    }

    /// Correspondance exacte uniquement, sans notion de préfixe ou de sous-réseau
    pub fn resolve(&self, address: &str) -> Option<RouterId> {
        self.owners.get(address).copied()
    }

    /// Adresses du routeur, dans l'ordre de configuration
    pub fn addresses_of(&self, router: RouterId) -> &[String] {
        if router.0 == 0 {
            return &[];
        }
        self.networks
            .get(router.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
