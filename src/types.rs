// Définitions des structures partagées entre les composants

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiant d'un routeur, dans l'intervalle [1, N]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouterId(pub u16);

impl RouterId {
    pub fn get(self) -> u16 {
        self.0
    }

    /// Index 0-based dans les tables de la topologie
    pub(crate) fn index(self) -> usize {
        usize::from(self.0) - 1
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Extrémité d'une requête de routage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    Source,
    Destination,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Destination => write!(f, "destination"),
        }
    }
}

/// Clé directionnelle du cache : (A, B) et (B, A) sont distinctes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    pub source: String,
    pub destination: String,
}

impl RouteKey {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.source, self.destination)
    }
}

/// Chemin finalisé : suite non vide de routeurs, de la source à la destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RouterId>", into = "Vec<RouterId>")]
pub struct Path(Vec<RouterId>);

impl TryFrom<Vec<RouterId>> for Path {
    type Error = String;

    fn try_from(routers: Vec<RouterId>) -> Result<Self, Self::Error> {
        Path::from_routers(routers).ok_or_else(|| "a path needs at least one router".to_string())
    }
}

impl From<Path> for Vec<RouterId> {
    fn from(path: Path) -> Self {
        path.0
    }
}

impl Path {
    /// Chemin trivial réduit à un seul routeur
    pub fn single(router: RouterId) -> Self {
        Path(vec![router])
    }

    /// Construit un chemin à partir d'une suite de routeurs, `None` si elle est vide
    pub fn from_routers(routers: Vec<RouterId>) -> Option<Self> {
        if routers.is_empty() {
            None
        } else {
            Some(Path(routers))
        }
    }

    pub fn routers(&self) -> &[RouterId] {
        &self.0
    }

    pub fn source(&self) -> RouterId {
        self.0[0]
    }

    pub fn destination(&self) -> RouterId {
        self.0[self.0.len() - 1]
    }

    /// Routeurs strictement entre la source et la destination
    pub fn intermediates(&self) -> &[RouterId] {
        if self.0.len() <= 2 {
            &[]
        } else {
            &self.0[1..self.0.len() - 1]
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodage historique : concaténation décimale des identifiants (ex: [1, 2, 3] -> "123").
    ///
    /// Uniquement pour l'affichage. Ambigu dès qu'un identifiant dépasse 9.
    pub fn legacy_digits(&self) -> String {
        self.0.iter().map(|r| r.0.to_string()).collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for router in &self.0 {
            if !first {
                write!(f, " --> ")?;
            }
            write!(f, "{}", router)?;
            first = false;
        }
        Ok(())
    }
}
