// Gestion des erreurs personnalisées

use std::fmt;
use std::error::Error as StdError;
use crate::types::{Endpoint, RouterId};

/// Erreurs du moteur de résolution de routes.
///
/// Toutes sont récupérables : l'appelant corrige sa saisie et réessaie.
/// `CacheFull` n'est qu'un avertissement, le chemin reste valide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    InvalidAddressFormat(String),
    AddressNotFound(Endpoint),
    InvalidRouterId(i64),
    SelfLoopRejected(RouterId),
    NoDirectLink { from: RouterId, to: RouterId },
    DestinationNotYetReachable { current: RouterId, destination: RouterId },
    CannotFinalizeYet { current: RouterId, destination: RouterId },
    CacheFull { capacity: usize },
    DuplicateRouteKey,
    DuplicateAddressAssignment { address: String, first: RouterId, second: RouterId },
    InvalidTransition { state: &'static str, action: &'static str },
    SessionAbandoned,
    IterationLimitReached(usize),
    UnknownSession(u64),
}

impl RouteError {
    /// Code court transmis aux clients réseau
    pub fn code(&self) -> &'static str {
        match self {
            RouteError::InvalidAddressFormat(_) => "InvalidAddressFormat",
            RouteError::AddressNotFound(_) => "AddressNotFound",
            RouteError::InvalidRouterId(_) => "InvalidRouterId",
            RouteError::SelfLoopRejected(_) => "SelfLoopRejected",
            RouteError::NoDirectLink { .. } => "NoDirectLink",
            RouteError::DestinationNotYetReachable { .. } => "DestinationNotYetReachable",
            RouteError::CannotFinalizeYet { .. } => "CannotFinalizeYet",
            RouteError::CacheFull { .. } => "CacheFull",
            RouteError::DuplicateRouteKey => "DuplicateRouteKey",
            RouteError::DuplicateAddressAssignment { .. } => "DuplicateAddressAssignment",
            RouteError::InvalidTransition { .. } => "InvalidTransition",
            RouteError::SessionAbandoned => "SessionAbandoned",
            RouteError::IterationLimitReached(_) => "IterationLimitReached",
            RouteError::UnknownSession(_) => "UnknownSession",
        }
    }

    /// Vrai pour les refus de saut qui laissent la session manuelle intacte
    pub fn is_hop_rejection(&self) -> bool {
        matches!(
            self,
            RouteError::InvalidRouterId(_)
                | RouteError::SelfLoopRejected(_)
                | RouteError::NoDirectLink { .. }
                | RouteError::DestinationNotYetReachable { .. }
                | RouteError::CannotFinalizeYet { .. }
        )
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidAddressFormat(addr) => write!(f, "Invalid IP format: {}", addr),
            RouteError::AddressNotFound(which) => {
                write!(f, "{} IP not found in any router's network list", which)
            }
            RouteError::InvalidRouterId(id) => write!(f, "Invalid router ID: {}", id),
            RouteError::SelfLoopRejected(router) => {
                write!(f, "Path is already at {}, a hop to itself is not allowed", router)
            }
            RouteError::NoDirectLink { from, to } => {
                write!(f, "Router {} has no direct link to router {}", from, to)
            }
            RouteError::DestinationNotYetReachable { current, destination } => write!(
                f,
                "{} is the destination, but {} has no direct link to it; choose an intermediate router first",
                destination, current
            ),
            RouteError::CannotFinalizeYet { current, destination } => write!(
                f,
                "Cannot finalize yet: {} has no direct link to {} (destination)",
                current, destination
            ),
            RouteError::CacheFull { capacity } => write!(f, "Route history full ({} entries)", capacity),
            RouteError::DuplicateRouteKey => write!(f, "Route already present in history"),
            RouteError::DuplicateAddressAssignment { address, first, second } => write!(
                f,
                "Address {} is assigned to both {} and {}",
                address, first, second
            ),
            RouteError::InvalidTransition { state, action } => {
                write!(f, "Cannot {} while session is {}", action, state)
            }
            RouteError::SessionAbandoned => write!(f, "Routing session abandoned"),
            RouteError::IterationLimitReached(limit) => {
                write!(f, "Manual routing gave up after {} proposed hops", limit)
            }
            RouteError::UnknownSession(id) => write!(f, "Unknown routing session {}", id),
        }
    }
}

impl StdError for RouteError {}

#[derive(Debug)]
pub enum AppError {
    NetworkError(String),
    ConfigError(String),
    IOError(std::io::Error),
    SerializationError(serde_json::Error),
    Route(RouteError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::IOError(err) => write!(f, "IO error: {}", err),
            AppError::SerializationError(err) => write!(f, "Serialization error: {}", err),
            AppError::Route(err) => write!(f, "Route error: {}", err),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::IOError(err) => Some(err),
            AppError::SerializationError(err) => Some(err),
            AppError::Route(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IOError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err)
    }
}

impl From<RouteError> for AppError {
    fn from(err: RouteError) -> Self {
        AppError::Route(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
