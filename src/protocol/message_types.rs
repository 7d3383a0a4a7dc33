// Messages JSON échangés entre le CLI et le service de routage

use serde::{Deserialize, Serialize};
use crate::resolver::Resolution;
use crate::types::{RouteKey, RouterId, Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Query { source: String, destination: String },
    ChooseDirect { session: u64 },
    ChooseManual { session: u64 },
    ProposeHop { session: u64, hop: i64 },
    Abandon { session: u64 },
    Topology,
    History,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub key: RouteKey,
    pub path: Path,
    pub legacy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Resolved { resolution: Resolution, legacy: String },
    OfferDirect { session: u64, source_router: RouterId, destination_router: RouterId },
    AwaitingHop {
        session: u64,
        current: RouterId,
        destination: RouterId,
        path_so_far: Vec<RouterId>,
        destination_reachable: bool,
    },
    Rejected { session: Option<u64>, code: String, message: String },
    Abandoned { session: u64, reason: String },
    Topology { matrix: Vec<Vec<u8>>, rendered: String },
    History { entries: Vec<HistoryEntry>, capacity: usize },
    Error { message: String },
}

impl Response {
    pub fn rejected(session: Option<u64>, error: &crate::error::RouteError) -> Self {
        Response::Rejected {
            session,
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }

    pub fn resolved(resolution: Resolution) -> Self {
        let legacy = resolution.path.legacy_digits();
        Response::Resolved { resolution, legacy }
    }
}
