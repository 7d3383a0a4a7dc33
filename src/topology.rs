// Matrice d'adjacence statique entre routeurs

use crate::error::{AppError, Result, RouteError};
use crate::types::RouterId;

/// Matrice de référence : R1-R2, R1-R4, R2-R3, R3-R4
pub const REFERENCE_MATRIX: [[u8; 4]; 4] = [
    [1, 1, 0, 1],
    [1, 1, 1, 0],
    [0, 1, 1, 1],
    [1, 0, 1, 1],
];

/// Relation "lien direct" entre routeurs, figée après construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyTopology {
    size: usize,
    links: Vec<bool>,
}

impl AdjacencyTopology {
    /// Construit la topologie depuis une matrice de 0/1 lue en configuration.
    ///
    /// La matrice doit être carrée, non vide, et sa diagonale à 1.
    /// Aucune symétrie n'est imposée.
    pub fn from_matrix(matrix: &[Vec<u8>]) -> Result<Self> {
        let size = matrix.len();
        if size == 0 {
            return Err(AppError::ConfigError("Adjacency matrix is empty".to_string()));
        }
        if size > usize::from(u16::MAX) {
            return Err(AppError::ConfigError(format!("Too many routers: {}", size)));
        }

        let mut links = Vec::with_capacity(size * size);
        for (i, row) in matrix.iter().enumerate() {
            if row.len() != size {
                return Err(AppError::ConfigError(format!(
                    "Adjacency row {} has {} entries, expected {}",
                    i + 1,
                    row.len(),
                    size
                )));
            }
            for (j, value) in row.iter().enumerate() {
                let linked = match *value {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(AppError::ConfigError(format!(
                            "Adjacency entry ({}, {}) must be 0 or 1, got {}",
                            i + 1,
                            j + 1,
                            other
                        )))
                    }
                };
                if i == j && !linked {
                    return Err(AppError::ConfigError(format!(
                        "Router {} must be adjacent to itself",
                        i + 1
                    )));
                }
                links.push(linked);
            }
        }

        Ok(Self { size, links })
    }

    pub fn reference() -> Self {
        let links = REFERENCE_MATRIX
            .iter()
            .flat_map(|row| row.iter().map(|v| *v == 1))
            .collect();
        Self { size: 4, links }
    }

    /// Nombre de routeurs N
    pub fn router_count(&self) -> usize {
        self.size
    }

    pub fn contains(&self, router: RouterId) -> bool {
        router.0 >= 1 && usize::from(router.0) <= self.size
    }

    /// Convertit une saisie numérique en identifiant de routeur valide
    pub fn router(&self, raw: i64) -> std::result::Result<RouterId, RouteError> {
        if raw >= 1 && raw <= self.size as i64 {
            Ok(RouterId(raw as u16))
        } else {
            Err(RouteError::InvalidRouterId(raw))
        }
    }

    pub fn routers(&self) -> impl Iterator<Item = RouterId> {
        (1..=self.size as u16).map(RouterId)
    }

    pub fn is_adjacent(&self, a: RouterId, b: RouterId) -> std::result::Result<bool, RouteError> {
        if !self.contains(a) {
            return Err(RouteError::InvalidRouterId(i64::from(a.0)));
        }
        if !self.contains(b) {
            return Err(RouteError::InvalidRouterId(i64::from(b.0)));
        }
        Ok(self.links[a.index() * self.size + b.index()])
    }

    /// Voisins directs d'un routeur, lui-même exclu
    pub fn neighbors(&self, router: RouterId) -> Vec<RouterId> {
        if !self.contains(router) {
            return Vec::new();
        }
        self.routers()
            .filter(|other| *other != router && self.links[router.index() * self.size + other.index()])
            .collect()
    }

    /// Matrice sous forme de 0/1, ligne par ligne
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.links
            .chunks(self.size)
            .map(|row| row.iter().map(|linked| u8::from(*linked)).collect())
            .collect()
    }

    /// Rendu texte de la matrice, en-tête de colonnes compris
    pub fn render(&self) -> String {
        let mut out = String::from(" ");
        for router in self.routers() {
            out.push_str(&format!(" {}", router.0));
        }
        out.push('\n');
        for (i, row) in self.to_matrix().iter().enumerate() {
            out.push_str(&format!("{}", i + 1));
            for value in row {
                out.push_str(&format!(" {}", value));
            }
            out.push('\n');
        }
        out
    }
}
