// Adaptateur console : traduit les saisies clavier en décisions et affiche les résultats

use std::io::{BufRead, Write};
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::error::{AppError, Result, RouteError};
use crate::hop_source::{HopSource, RandomHops};
use crate::net_utils::{parse_number, validate_ip};
use crate::read_config::{NetworkConfig, RouterEntry};
use crate::resolver::{CacheStatus, Resolution, RouteResolver};
use crate::topology::AdjacencyTopology;
use crate::types::{Endpoint, RouterId};

/// Limite de sauts par session quand les choix sont tirés au hasard
const AUTO_HOP_LIMIT: usize = 64;

pub struct Console<R: BufRead, W: Write> {
    input: R,
    output: W,
    router_count: usize,
    manual_announced: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            router_count: 0,
            manual_announced: false,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{}", text) {
            error!("Console write failed: {}", e);
        }
    }

    /// Affiche `text` et lit une ligne ; `None` en fin de saisie
    fn prompt(&mut self, text: &str) -> Option<String> {
        if let Err(e) = write!(self.output, "{}", text).and_then(|_| self.output.flush()) {
            error!("Console write failed: {}", e);
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                error!("Console read failed: {}", e);
                None
            }
        }
    }

    fn prompt_number(&mut self, text: &str) -> Option<i64> {
        self.prompt(text).map(|line| parse_number(&line))
    }

    pub fn print_matrix(&mut self, topology: &AdjacencyTopology) {
        self.say("Routers are connected like this (1 = Direct Link):");
        let rendered = topology.render();
        self.say(rendered.trim_end());
    }

    /// Saisie interactive des réseaux de chaque routeur
    pub fn read_router_networks(&mut self, router_count: usize, max_networks: usize) -> Option<Vec<RouterEntry>> {
        let mut counts = Vec::with_capacity(router_count);
        for router in 1..=router_count {
            let count = loop {
                let n = self.prompt_number(&format!(
                    "How many networks are joined to router {} (max {}): ",
                    router, max_networks
                ))?;
                if n >= 0 && n <= max_networks as i64 {
                    break n as usize;
                }
            };
            counts.push(count);
        }
        self.say(&format!("Total networks defined: {}", counts.iter().sum::<usize>()));

        let mut entries: Vec<RouterEntry> = Vec::with_capacity(router_count);
        for (i, count) in counts.into_iter().enumerate() {
            let mut networks = Vec::with_capacity(count);
            for j in 1..=count {
                let address = loop {
                    let address = self.prompt(&format!("Enter router {} Network IP address {}: ", i + 1, j))?;
                    if !validate_ip(&address) {
                        continue;
                    }
                    let owner = entries
                        .iter()
                        .position(|e| e.networks.contains(&address))
                        .or_else(|| networks.contains(&address).then_some(i));
                    match owner {
                        Some(k) => self.say(&format!(
                            "Address {} is already assigned to router {}. Please re-enter.",
                            address,
                            k + 1
                        )),
                        None => break address,
                    }
                };
                networks.push(address);
            }
            entries.push(RouterEntry { networks });
        }
        self.say("\nIP configurations loaded successfully.");
        Some(entries)
    }

    /// Demande une adresse jusqu'à ce qu'elle soit valide et connue
    pub fn read_endpoint(&mut self, resolver: &RouteResolver, which: Endpoint) -> Option<(String, RouterId)> {
        let label = match which {
            Endpoint::Source => "source",
            Endpoint::Destination => "Destination",
        };
        loop {
            let address = self.prompt(&format!("Enter {} IP address: ", label))?;
            match resolver.locate_one(&address, which) {
                Ok(router) => return Some((address, router)),
                Err(RouteError::InvalidAddressFormat(_)) => self.say("Invalid IP format. Please re-enter."),
                Err(_) => {
                    let name = match which {
                        Endpoint::Source => "Source",
                        Endpoint::Destination => "Destination",
                    };
                    self.say(&format!(
                        "Error: {} IP not found in any router's network list. Please re-enter.",
                        name
                    ));
                }
            }
        }
    }

    pub fn print_resolution(&mut self, resolution: &Resolution) {
        let key = &resolution.key;
        let path = &resolution.path;
        match resolution.cache {
            CacheStatus::Hit => {
                self.say("\n--- HISTORY FOUND ---");
                self.say(&format!(
                    "Source IP address: {} \n--> Source Router: {} \n--> Destination Router: {} \n--> Destination IP address: {}",
                    key.source,
                    resolution.source_router.get(),
                    resolution.destination_router.get(),
                    key.destination
                ));
                self.say(&format!("Intermediate Routers details (Concatenated IDs): {}", path.legacy_digits()));
            }
            CacheStatus::Bypassed => {
                self.say(&format!(
                    "\nSource and destination are both on {}, no routing needed.",
                    resolution.source_router
                ));
            }
            CacheStatus::AlreadyCached => {
                self.say("\n--- ROUTE ALREADY LOGGED ---");
                self.say(&format!("Intermediate Routers Path (IDs): {}", path.legacy_digits()));
                self.say(&format!("\nPath established: {}", path));
            }
            CacheStatus::Stored => {
                self.say("\n--- NEW ROUTE LOGGED ---");
                self.say(&format!("Source IP: {}", key.source));
                self.say(&format!("Intermediate Routers Path (IDs): {}", path.legacy_digits()));
                self.say(&format!("\nPath established: {}", path));
            }
            CacheStatus::Full => {
                self.say(&format!("\nPath established: {}", path));
                self.say("\nWarning: Route history full.");
            }
        }
    }

    /// Boucle de requêtes ; `auto` remplace l'opérateur pour les choix de sauts
    pub fn run(&mut self, resolver: &mut RouteResolver, mut auto: Option<&mut dyn HopSource>) {
        self.router_count = resolver.topology().router_count();
        let mut query = 0;

        loop {
            query += 1;
            self.say(&format!("\n--- Start Routing Query {} ---", query));

            let Some((source, source_router)) = self.read_endpoint(resolver, Endpoint::Source) else {
                break;
            };
            self.say(&format!("Source router is {}", source_router.get()));

            let Some((destination, destination_router)) = self.read_endpoint(resolver, Endpoint::Destination) else {
                break;
            };
            self.say(&format!("Destination router is {}", destination_router.get()));

            self.manual_announced = false;
            let outcome = match auto.as_mut() {
                Some(hops) => resolver.resolve(&source, &destination, &mut **hops),
                None => resolver.resolve(&source, &destination, self),
            };

            match outcome {
                Ok(resolution) => self.print_resolution(&resolution),
                Err(e) => self.say(&format!("\nNo route established: {}", e)),
            }

            let answer = self.prompt_number("\nDo you want to continue routing? (0=Yes, 1=No): ");
            if answer != Some(0) {
                break;
            }
        }

        self.say("\n--- Simulation Ended ---");
    }
}

impl<R: BufRead, W: Write> HopSource for Console<R, W> {
    fn choose_direct(&mut self, source: RouterId, destination: RouterId) -> Option<bool> {
        self.say(&format!("Direct link found between {} and {}.", source, destination));
        let choice = self.prompt_number("Do you want to choose the direct path for routing (1=Yes, 0=No/Custom): ")?;
        if choice == 1 {
            self.say("\n--- DIRECT ROUTE SELECTED ---");
            Some(true)
        } else {
            Some(false)
        }
    }

    fn next_hop(&mut self, current: RouterId, _destination: RouterId, _path_so_far: &[RouterId]) -> Option<i64> {
        if !self.manual_announced {
            self.say("\n--- MANUAL ROUTE DEFINITION ---");
            self.manual_announced = true;
        }
        let hop = self.prompt_number(&format!(
            "Current router: {}. Enter next intermediate router (1-{}, or 0 to finalize): ",
            current, self.router_count
        ))?;
        Some(hop)
    }

    fn on_rejected(&mut self, error: &RouteError) {
        match error {
            RouteError::InvalidRouterId(_) => {
                let count = self.router_count;
                self.say(&format!("Invalid router ID. Must be between 1 and {}.", count));
            }
            RouteError::NoDirectLink { from, to } => {
                self.say(&format!("Invalid path: Router {} has no direct link to Router {}.", from, to));
            }
            other => self.say(&format!("{}.", other)),
        }
    }

    fn on_advance(&mut self, router: RouterId, destination: RouterId, destination_reachable: bool) {
        if destination_reachable {
            self.say(&format!(
                "{} is now directly connected to Destination {}. Type 0 to finalize or enter another intermediate router.",
                router, destination
            ));
        }
    }
}

/// Simulation console complète sur stdin/stdout
pub fn run_simulation(mut config: NetworkConfig, auto_seed: Option<u64>) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock());

    console.say("--- Network Router Simulation ---");
    let topology = AdjacencyTopology::from_matrix(&config.adjacency)?;
    console.print_matrix(&topology);

    if !config.has_networks() {
        config.routers = console
            .read_router_networks(topology.router_count(), config.max_networks_per_router)
            .ok_or_else(|| AppError::ConfigError("Network setup interrupted".to_string()))?;
    }

    let mut resolver = config.build_resolver()?;
    match auto_seed {
        Some(seed) => {
            resolver = resolver.with_iteration_cap(Some(config.max_manual_hops.unwrap_or(AUTO_HOP_LIMIT)));
            let mut hops = RandomHops::new(StdRng::seed_from_u64(seed), topology.router_count());
            console.run(&mut resolver, Some(&mut hops));
        }
        None => console.run(&mut resolver, None),
    }
    Ok(())
}
