// Construction interactive d'un chemin, saut par saut, sous contrainte d'adjacence

use std::sync::Arc;
use log::debug;
use crate::error::RouteError;
use crate::hop_source::HopSource;
use crate::topology::AdjacencyTopology;
use crate::types::{Path, RouterId};

/// Saut spécial demandant la finalisation du chemin
pub const FINALIZE_HOP: i64 = 0;

/// États de la session de construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Init,
    /// Lien direct source -> destination disponible, en attente du choix direct/manuel
    OfferDirect,
    Manual,
    Finalized,
    Abandoned,
}

impl BuilderState {
    pub fn name(self) -> &'static str {
        match self {
            BuilderState::Init => "init",
            BuilderState::OfferDirect => "offering a direct link",
            BuilderState::Manual => "in manual routing",
            BuilderState::Finalized => "finalized",
            BuilderState::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BuilderState::Finalized | BuilderState::Abandoned)
    }
}

/// Résultat d'un saut accepté
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopOutcome {
    /// Le chemin avance d'un routeur ; `destination_reachable` signale qu'un
    /// lien direct vers la destination existe désormais
    Advanced { router: RouterId, destination_reachable: bool },
    Finalized(Path),
}

/// Session de construction d'un chemin entre deux routeurs
#[derive(Debug, Clone)]
pub struct PathBuilder {
    topology: Arc<AdjacencyTopology>,
    source: RouterId,
    destination: RouterId,
    current: RouterId,
    path_so_far: Vec<RouterId>,
    state: BuilderState,
    proposals: usize,
    max_proposals: Option<usize>,
    finished: Option<Path>,
}

impl PathBuilder {
    pub fn new(
        topology: Arc<AdjacencyTopology>,
        source: RouterId,
        destination: RouterId,
    ) -> Result<Self, RouteError> {
        for router in [source, destination] {
            if !topology.contains(router) {
                return Err(RouteError::InvalidRouterId(i64::from(router.get())));
            }
        }
        Ok(Self {
            topology,
            source,
            destination,
            current: source,
            path_so_far: vec![source],
            state: BuilderState::Init,
            proposals: 0,
            max_proposals: None,
            finished: None,
        })
    }

    /// Limite le nombre de sauts proposés en mode manuel ; au-delà, la session est abandonnée
    pub fn with_iteration_cap(mut self, max_proposals: usize) -> Self {
        self.max_proposals = Some(max_proposals);
        self
    }

    /// Quitte `Init` : offre le lien direct s'il existe, sinon passe en mode manuel
    pub fn start(&mut self) -> BuilderState {
        if self.state == BuilderState::Init {
            self.state = if self.linked(self.source, self.destination) {
                BuilderState::OfferDirect
            } else {
                self.enter_manual();
                BuilderState::Manual
            };
            debug!(
                "Path session {} -> {} started: {}",
                self.source,
                self.destination,
                self.state.name()
            );
        }
        self.state
    }

    pub fn choose_direct(&mut self) -> Result<Path, RouteError> {
        self.expect_state(BuilderState::OfferDirect, "choose the direct link")?;
        debug!("Direct link {} -> {} selected", self.source, self.destination);
        Ok(self.finalize())
    }

    pub fn choose_manual(&mut self) -> Result<(), RouteError> {
        self.expect_state(BuilderState::OfferDirect, "switch to manual routing")?;
        self.enter_manual();
        self.state = BuilderState::Manual;
        Ok(())
    }

    /// Propose le prochain saut. `FINALIZE_HOP` demande la finalisation.
    ///
    /// Un refus laisse la session inchangée.
    pub fn propose_hop(&mut self, hop: i64) -> Result<HopOutcome, RouteError> {
        self.expect_state(BuilderState::Manual, "propose a hop")?;

        self.proposals += 1;
        if let Some(limit) = self.max_proposals {
            if self.proposals > limit {
                debug!("Path session {} -> {} hit its hop limit", self.source, self.destination);
                self.state = BuilderState::Abandoned;
                return Err(RouteError::IterationLimitReached(limit));
            }
        }

        let current = self.current;
        let destination = self.destination;

        if hop == FINALIZE_HOP {
            return if self.linked(current, destination) {
                Ok(HopOutcome::Finalized(self.finalize()))
            } else {
                Err(RouteError::CannotFinalizeYet { current, destination })
            };
        }

        let next = self.topology.router(hop)?;

        if next == destination {
            return if self.linked(current, destination) {
                Ok(HopOutcome::Finalized(self.finalize()))
            } else {
                Err(RouteError::DestinationNotYetReachable { current, destination })
            };
        }

        if next == current {
            return Err(RouteError::SelfLoopRejected(current));
        }

        if !self.linked(current, next) {
            return Err(RouteError::NoDirectLink { from: current, to: next });
        }

        self.path_so_far.push(next);
        self.current = next;
        let destination_reachable = self.linked(next, destination);
        debug!("Path advanced to {} (destination reachable: {})", next, destination_reachable);
        Ok(HopOutcome::Advanced { router: next, destination_reachable })
    }

    /// Annule la session ; le chemin partiel est perdu
    pub fn abandon(&mut self) -> Result<(), RouteError> {
        if self.state == BuilderState::Finalized {
            return Err(RouteError::InvalidTransition {
                state: self.state.name(),
                action: "abandon",
            });
        }
        self.state = BuilderState::Abandoned;
        self.path_so_far.truncate(1);
        self.current = self.source;
        Ok(())
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn source(&self) -> RouterId {
        self.source
    }

    pub fn destination(&self) -> RouterId {
        self.destination
    }

    pub fn current(&self) -> RouterId {
        self.current
    }

    pub fn path_so_far(&self) -> &[RouterId] {
        &self.path_so_far
    }

    /// Chemin complet, disponible seulement une fois la session finalisée
    pub fn path(&self) -> Option<&Path> {
        self.finished.as_ref()
    }

    pub fn destination_reachable(&self) -> bool {
        self.linked(self.current, self.destination)
    }

    // Point d'arrivée commun du choix direct et des deux finalisations manuelles
    fn finalize(&mut self) -> Path {
        self.path_so_far.push(self.destination);
        self.current = self.destination;
        self.state = BuilderState::Finalized;
        let path = Path::from_routers(self.path_so_far.clone()).unwrap_or_else(|| Path::single(self.destination));
        self.finished = Some(path.clone());
        path
    }

    fn enter_manual(&mut self) {
        self.current = self.source;
        self.path_so_far = vec![self.source];
    }

    fn expect_state(&self, expected: BuilderState, action: &'static str) -> Result<(), RouteError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RouteError::InvalidTransition {
                state: self.state.name(),
                action,
            })
        }
    }

    fn linked(&self, a: RouterId, b: RouterId) -> bool {
        self.topology.is_adjacent(a, b).unwrap_or(false)
    }
}

/// Pilote une session jusqu'à son terme avec une source de sauts.
///
/// Les refus de saut sont signalés à `hops` et la boucle continue ; une source
/// qui ne répond plus (`None`) abandonne la session.
pub fn drive<S: HopSource + ?Sized>(builder: &mut PathBuilder, hops: &mut S) -> Result<Path, RouteError> {
    if builder.state() == BuilderState::Init {
        builder.start();
    }

    if builder.state() == BuilderState::OfferDirect {
        match hops.choose_direct(builder.source(), builder.destination()) {
            Some(true) => return builder.choose_direct(),
            Some(false) => builder.choose_manual()?,
            None => {
                builder.abandon()?;
                return Err(RouteError::SessionAbandoned);
            }
        }
    }

    loop {
        if builder.state().is_terminal() {
            return builder.path().cloned().ok_or(RouteError::SessionAbandoned);
        }

        let hop = match hops.next_hop(builder.current(), builder.destination(), builder.path_so_far()) {
            Some(hop) => hop,
            None => {
                builder.abandon()?;
                return Err(RouteError::SessionAbandoned);
            }
        };

        match builder.propose_hop(hop) {
            Ok(HopOutcome::Finalized(path)) => return Ok(path),
            Ok(HopOutcome::Advanced { router, destination_reachable }) => {
                hops.on_advance(router, builder.destination(), destination_reachable);
            }
            Err(err) if err.is_hop_rejection() => hops.on_rejected(&err),
            Err(err) => return Err(err),
        }
    }
}
