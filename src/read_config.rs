// Module de lecture de configuration basé sur le hostname

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use crate::directory::RouterDirectory;
use crate::error::{AppError, Result};
use crate::resolver::RouteResolver;
use crate::route_cache::{RouteCache, MAX_ROUTE_HISTORY};
use crate::topology::{AdjacencyTopology, REFERENCE_MATRIX};

const CONFIG_DIR: &str = "src/conf";

/// Nombre maximal de réseaux rattachés à un routeur
pub const MAX_NETWORKS_PER_ROUTER: usize = 4;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RouterEntry {
    #[serde(default)]
    pub networks: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NetworkConfig {
    pub adjacency: Vec<Vec<u8>>,
    /// Routeurs dans l'ordre : le premier est R1. Vide = saisie interactive.
    #[serde(default)]
    pub routers: Vec<RouterEntry>,
    #[serde(default = "default_max_route_history")]
    pub max_route_history: usize,
    #[serde(default = "default_max_networks_per_router")]
    pub max_networks_per_router: usize,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    #[serde(default)]
    pub max_manual_hops: Option<usize>,
}

fn default_max_route_history() -> usize {
    MAX_ROUTE_HISTORY
}

fn default_max_networks_per_router() -> usize {
    MAX_NETWORKS_PER_ROUTER
}

fn default_port() -> u16 {
    5000
}

fn default_session_timeout_secs() -> u64 {
    120
}

impl NetworkConfig {
    /// Topologie de référence à 4 routeurs, sans adresse
    pub fn reference() -> Self {
        Self {
            adjacency: REFERENCE_MATRIX.iter().map(|row| row.to_vec()).collect(),
            routers: Vec::new(),
            max_route_history: MAX_ROUTE_HISTORY,
            max_networks_per_router: MAX_NETWORKS_PER_ROUTER,
            port: default_port(),
            session_timeout_secs: default_session_timeout_secs(),
            max_manual_hops: None,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: NetworkConfig = toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Vérifie la cohérence de la configuration sans construire l'annuaire
    pub fn validate(&self) -> Result<()> {
        let topology = AdjacencyTopology::from_matrix(&self.adjacency)?;
        if !self.routers.is_empty() && self.routers.len() != topology.router_count() {
            return Err(AppError::ConfigError(format!(
                "{} routers configured but the adjacency matrix has {}",
                self.routers.len(),
                topology.router_count()
            )));
        }
        if self.max_route_history == 0 {
            return Err(AppError::ConfigError("max_route_history must be positive".to_string()));
        }
        RouterDirectory::build(&self.assignments(), self.max_networks_per_router)?;
        Ok(())
    }

    /// Adresses par routeur, dans l'ordre des routeurs
    pub fn assignments(&self) -> Vec<Vec<String>> {
        self.routers.iter().map(|r| r.networks.clone()).collect()
    }

    pub fn has_networks(&self) -> bool {
        self.routers.iter().any(|r| !r.networks.is_empty())
    }

    pub fn build_resolver(&self) -> Result<RouteResolver> {
        let topology = Arc::new(AdjacencyTopology::from_matrix(&self.adjacency)?);
        let directory = RouterDirectory::build(&self.assignments(), self.max_networks_per_router)?;
        let cache = RouteCache::new(self.max_route_history);
        Ok(RouteResolver::new(topology, directory, cache).with_iteration_cap(self.max_manual_hops))
    }
}

/// Lit un fichier de configuration donné
pub fn read_config_file(path: &Path) -> Result<NetworkConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::ConfigError(format!("Failed to read config file {}: {}", path.display(), e)))?;
    let config = NetworkConfig::from_toml(&content)
        .map_err(|e| AppError::ConfigError(format!("{} ({})", e, path.display())))?;
    log::info!("Loaded configuration from {}", path.display());
    log::debug!("Config: {:?}", config);
    Ok(config)
}

/// Lit la configuration : `src/conf/config_<hostname>.toml`, sinon `src/conf/config_default.toml`
pub fn read_network_config() -> Result<NetworkConfig> {
    let candidates = match get_hostname() {
        Ok(hostname) => vec![format!("{}/config_{}.toml", CONFIG_DIR, hostname)],
        Err(e) => {
            log::warn!("{}", e);
            Vec::new()
        }
    };

    for candidate in candidates
        .into_iter()
        .chain(std::iter::once(format!("{}/config_default.toml", CONFIG_DIR)))
    {
        if Path::new(&candidate).exists() {
            return read_config_file(Path::new(&candidate));
        }
    }

    Err(AppError::ConfigError(format!(
        "No config file found in {}. Available configs: {}",
        CONFIG_DIR,
        list_available_configs()
    )))
}

/// Obtient le hostname de la machine
fn get_hostname() -> Result<String> {
    hostname::get()
        .map_err(|e| AppError::ConfigError(format!("Failed to get hostname: {}", e)))?
        .to_string_lossy()
        .to_string()
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ConfigError("Invalid hostname".to_string()))
        .map(|s| s.to_string())
}

/// Liste les fichiers de configuration disponibles
fn list_available_configs() -> String {
    if let Ok(entries) = fs::read_dir(CONFIG_DIR) {
        let configs: Vec<String> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let path = entry.path();
                if path.extension()? == "toml" {
                    path.file_name()?.to_str().map(|s| s.to_string())
                } else {
                    None
                }
            })
            .collect();
        configs.join(", ")
    } else {
        "Unable to list config directory".to_string()
    }
}
