// Sources de décisions pour une session de construction de chemin

use std::collections::VecDeque;
use rand::Rng;
use crate::error::RouteError;
use crate::path_builder::FINALIZE_HOP;
use crate::types::RouterId;

/// Point de suspension d'une session : qui décide du prochain saut.
///
/// Renvoyer `None` signifie que l'opérateur abandonne la session.
pub trait HopSource {
    /// `Some(true)` pour emprunter le lien direct, `Some(false)` pour le routage manuel
    fn choose_direct(&mut self, source: RouterId, destination: RouterId) -> Option<bool>;

    fn next_hop(&mut self, current: RouterId, destination: RouterId, path_so_far: &[RouterId]) -> Option<i64>;

    fn on_rejected(&mut self, _error: &RouteError) {}

    fn on_advance(&mut self, _router: RouterId, _destination: RouterId, _destination_reachable: bool) {}
}

/// Suite finie de décisions, épuisée dans l'ordre
#[derive(Debug, Clone, Default)]
pub struct ScriptedHops {
    direct: Option<bool>,
    hops: VecDeque<i64>,
    rejections: Vec<RouteError>,
    advisories: Vec<RouterId>,
}

impl ScriptedHops {
    pub fn new(direct: Option<bool>, hops: impl IntoIterator<Item = i64>) -> Self {
        Self {
            direct,
            hops: hops.into_iter().collect(),
            rejections: Vec::new(),
            advisories: Vec::new(),
        }
    }

    /// Emprunte le lien direct dès qu'il est proposé
    pub fn direct() -> Self {
        Self::new(Some(true), [])
    }

    /// Refuse le lien direct et propose les sauts donnés
    pub fn manual(hops: impl IntoIterator<Item = i64>) -> Self {
        Self::new(Some(false), hops)
    }

    /// Refus reçus, dans l'ordre
    pub fn rejections(&self) -> &[RouteError] {
        &self.rejections
    }

    /// Routeurs depuis lesquels la destination est devenue directement joignable
    pub fn advisories(&self) -> &[RouterId] {
        &self.advisories
    }

    pub fn remaining(&self) -> usize {
        self.hops.len()
    }
}

impl HopSource for ScriptedHops {
    fn choose_direct(&mut self, _source: RouterId, _destination: RouterId) -> Option<bool> {
        self.direct
    }

    fn next_hop(&mut self, _current: RouterId, _destination: RouterId, _path_so_far: &[RouterId]) -> Option<i64> {
        self.hops.pop_front()
    }

    fn on_rejected(&mut self, error: &RouteError) {
        self.rejections.push(error.clone());
    }

    fn on_advance(&mut self, router: RouterId, _destination: RouterId, destination_reachable: bool) {
        if destination_reachable {
            self.advisories.push(router);
        }
    }
}

/// Opérateur aléatoire, pour la simulation automatique et le fuzzing.
///
/// Tire des sauts dans [0, N + 1] afin d'exercer aussi les refus. À combiner
/// avec une limite d'itérations sur la session.
#[derive(Debug, Clone)]
pub struct RandomHops<R: Rng> {
    rng: R,
    router_count: usize,
}

impl<R: Rng> RandomHops<R> {
    pub fn new(rng: R, router_count: usize) -> Self {
        Self { rng, router_count }
    }
}

impl<R: Rng> HopSource for RandomHops<R> {
    fn choose_direct(&mut self, _source: RouterId, _destination: RouterId) -> Option<bool> {
        Some(self.rng.gen_bool(0.5))
    }

    fn next_hop(&mut self, _current: RouterId, _destination: RouterId, _path_so_far: &[RouterId]) -> Option<i64> {
        Some(self.rng.gen_range(FINALIZE_HOP..=self.router_count as i64 + 1))
    }

    fn on_rejected(&mut self, error: &RouteError) {
        log::debug!("Random hop rejected: {}", error);
    }
}
